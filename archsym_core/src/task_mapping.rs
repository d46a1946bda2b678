//! Task allocations and their canonical orbit representatives.

use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};
use log::trace;

use crate::perm::{Perm, PermSet};
use crate::perm_group::PermGroup;

/// An assignment of tasks to processing elements: `tasks[i]` is the 1-based
/// PE running task `i`. Ordered lexicographically.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TaskAllocation {
    tasks: Vec<usize>,
}

impl TaskAllocation {
    #[must_use]
    pub fn new(tasks: Vec<usize>) -> TaskAllocation {
        TaskAllocation { tasks }
    }

    #[must_use]
    pub fn tasks(&self) -> &[usize] {
        &self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Apply `perm` to every task inside the acting range
    /// `offset + 1 ..= offset + perm.degree()`; tasks outside are left
    /// untouched.
    #[must_use]
    pub fn permuted(&self, perm: &Perm, offset: usize) -> TaskAllocation {
        let min_pe = offset + 1;
        let max_pe = offset + perm.degree();

        TaskAllocation {
            tasks: self
                .tasks
                .iter()
                .map(|&pe| {
                    if pe < min_pe || pe > max_pe {
                        pe
                    } else {
                        perm.apply(pe - offset) + offset
                    }
                })
                .collect(),
        }
    }
}

impl From<Vec<usize>> for TaskAllocation {
    fn from(tasks: Vec<usize>) -> TaskAllocation {
        TaskAllocation::new(tasks)
    }
}

/// An allocation paired with the canonical representative of its orbit.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskMapping {
    allocation: TaskAllocation,
    representative: TaskAllocation,
}

impl TaskMapping {
    #[must_use]
    pub fn new(allocation: TaskAllocation, representative: TaskAllocation) -> TaskMapping {
        TaskMapping {
            allocation,
            representative,
        }
    }

    #[must_use]
    pub fn allocation(&self) -> &TaskAllocation {
        &self.allocation
    }

    #[must_use]
    pub fn representative(&self) -> &TaskAllocation {
        &self.representative
    }
}

/// The set of orbit representatives seen so far; equivalent allocations map
/// to the same equivalence class index.
#[derive(Clone, Default, Debug)]
pub struct TaskOrbits {
    representatives: Vec<TaskAllocation>,
    index: FxHashMap<TaskAllocation, usize>,
}

impl TaskOrbits {
    #[must_use]
    pub fn new() -> TaskOrbits {
        TaskOrbits::default()
    }

    /// Insert a representative. Returns whether it was new, along with its
    /// equivalence class index.
    pub fn insert(&mut self, representative: TaskAllocation) -> (bool, usize) {
        if let Some(&class) = self.index.get(&representative) {
            return (false, class);
        }

        let class = self.representatives.len();
        self.index.insert(representative.clone(), class);
        self.representatives.push(representative);

        (true, class)
    }

    /// Whether the allocation is a registered representative.
    #[must_use]
    pub fn is_representative(&self, allocation: &TaskAllocation) -> bool {
        self.index.contains_key(allocation)
    }

    #[must_use]
    pub fn num_orbits(&self) -> usize {
        self.representatives.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskAllocation> {
        self.representatives.iter()
    }
}

/// Representative search strategy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ReprMethod {
    /// Enumerate every group element, keep the lexicographic minimum.
    #[default]
    Iterate,
    /// Breadth-first search over the allocation's orbit with hashing.
    Orbits,
    /// Greedy descent over the generators; approximate, the result is in
    /// the orbit but not necessarily minimal.
    LocalSearch,
}

/// Descent flavor for [`ReprMethod::LocalSearch`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LocalSearchVariant {
    /// Take the best improving generator each step.
    #[default]
    Bfs,
    /// Take the first improving generator each step.
    Dfs,
    /// Simulated annealing with the linear schedule `T(k) = T0 * (1 - k/K)`.
    SaLinear,
}

#[derive(Clone, Debug)]
pub struct ReprOptions {
    pub method: ReprMethod,
    pub variant: LocalSearchVariant,
    /// Shift of the acting range: the group acts on PEs
    /// `offset + 1 ..= offset + degree`.
    pub offset: usize,
    /// Early-exit when a registered representative is met during the
    /// search.
    pub match_reprs: bool,
    /// Also descend along generator inverses.
    pub invert_generators: bool,
    /// Augment the generator list with pairwise products.
    pub append_generators: bool,
    /// SA schedule length.
    pub sa_iterations: usize,
    /// SA initial temperature.
    pub sa_initial_temperature: f64,
    /// Seed for the SA acceptance draws; `None` seeds from entropy.
    pub sa_seed: Option<u64>,
    /// Cap on elements examined by ITERATE / ORBITS; the search returns the
    /// best allocation found when the budget runs out.
    pub element_budget: Option<usize>,
}

impl Default for ReprOptions {
    fn default() -> ReprOptions {
        ReprOptions {
            method: ReprMethod::default(),
            variant: LocalSearchVariant::default(),
            offset: 0,
            match_reprs: true,
            invert_generators: false,
            append_generators: false,
            sa_iterations: 100,
            sa_initial_temperature: 1.0,
            sa_seed: None,
            element_budget: None,
        }
    }
}

/// The orbit representative of `tasks` under `group`, by the method chosen
/// in `options`. `orbits` is only consulted in match mode.
#[must_use]
pub(crate) fn min_elem(
    group: &PermGroup,
    tasks: &TaskAllocation,
    orbits: Option<&TaskOrbits>,
    options: &ReprOptions,
) -> TaskAllocation {
    let orbits = if options.match_reprs { orbits } else { None };

    match options.method {
        ReprMethod::Iterate => min_elem_iterate(group, tasks, orbits, options),
        ReprMethod::Orbits => min_elem_orbits(group, tasks, orbits, options),
        ReprMethod::LocalSearch => min_elem_local_search(group, tasks, options),
    }
}

fn min_elem_iterate(
    group: &PermGroup,
    tasks: &TaskAllocation,
    orbits: Option<&TaskOrbits>,
    options: &ReprOptions,
) -> TaskAllocation {
    let mut minimum = tasks.clone();
    let mut examined = 0;

    for element in group {
        let permuted = tasks.permuted(&element, options.offset);

        if let Some(orbits) = orbits {
            if orbits.is_representative(&permuted) {
                trace!("matched registered representative {permuted:?}");
                return permuted;
            }
        }

        if permuted < minimum {
            minimum = permuted;
        }

        examined += 1;
        if options.element_budget.is_some_and(|budget| examined >= budget) {
            break;
        }
    }

    minimum
}

fn min_elem_orbits(
    group: &PermGroup,
    tasks: &TaskAllocation,
    orbits: Option<&TaskOrbits>,
    options: &ReprOptions,
) -> TaskAllocation {
    let mut minimum = tasks.clone();

    let mut seen: FxHashSet<TaskAllocation> = FxHashSet::default();
    seen.insert(tasks.clone());

    let mut queue = VecDeque::from([tasks.clone()]);

    while let Some(current) = queue.pop_front() {
        for r#gen in group.generators() {
            let permuted = current.permuted(r#gen, options.offset);

            if let Some(orbits) = orbits {
                if orbits.is_representative(&permuted) {
                    return permuted;
                }
            }

            if seen.contains(&permuted) {
                continue;
            }

            if permuted < minimum {
                minimum = permuted.clone();
            }

            seen.insert(permuted.clone());

            if options.element_budget.is_some_and(|budget| seen.len() >= budget) {
                return minimum;
            }

            queue.push_back(permuted);
        }
    }

    minimum
}

fn min_elem_local_search(
    group: &PermGroup,
    tasks: &TaskAllocation,
    options: &ReprOptions,
) -> TaskAllocation {
    let mut generators: Vec<Perm> = group.generators().iter().cloned().collect();

    if options.invert_generators {
        let inverses: Vec<Perm> = generators.iter().map(Perm::inverse).collect();
        generators.extend(inverses);
    }

    if options.append_generators {
        let mut products = Vec::new();
        for a in &generators {
            for b in &generators {
                products.push(a * b);
            }
        }
        generators.extend(products);

        let mut unique = PermSet::new();
        for r#gen in generators {
            unique.push(r#gen);
        }
        unique.make_unique();
        generators = unique.iter().cloned().collect();
    }

    match options.variant {
        LocalSearchVariant::Bfs => descend(tasks, &generators, options, true),
        LocalSearchVariant::Dfs => descend(tasks, &generators, options, false),
        LocalSearchVariant::SaLinear => anneal(tasks, &generators, options),
    }
}

// Greedy descent: repeat until no generator strictly decreases the
// allocation; best_step picks the minimum successor, otherwise the first
// improving one is taken.
fn descend(
    tasks: &TaskAllocation,
    generators: &[Perm],
    options: &ReprOptions,
    best_step: bool,
) -> TaskAllocation {
    let mut current = tasks.clone();

    loop {
        let mut next: Option<TaskAllocation> = None;

        for r#gen in generators {
            let permuted = current.permuted(r#gen, options.offset);

            if permuted >= current {
                continue;
            }

            let improves = next.as_ref().is_none_or(|best| permuted < *best);
            if improves {
                next = Some(permuted);

                if !best_step {
                    break;
                }
            }
        }

        match next {
            Some(better) => current = better,
            None => return current,
        }
    }
}

// Simulated annealing over the generator moves with a linear temperature
// schedule; returns the best allocation visited.
fn anneal(tasks: &TaskAllocation, generators: &[Perm], options: &ReprOptions) -> TaskAllocation {
    if generators.is_empty() {
        return tasks.clone();
    }

    let mut rng = match options.sa_seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let mut current = tasks.clone();
    let mut best = tasks.clone();

    // all reachable allocations stay within the initial maximum and the
    // acting range, so this base keeps values order-consistent
    let base = tasks
        .tasks()
        .iter()
        .max()
        .copied()
        .unwrap_or(0)
        .max(options.offset + generators[0].degree()) as f64
        + 1.0;

    let k_max = options.sa_iterations.max(1);

    for k in 0..k_max {
        let temperature =
            options.sa_initial_temperature * (1.0 - (k as f64) / (k_max as f64));

        let r#gen = &generators[rng.usize(0..generators.len())];
        let candidate = current.permuted(r#gen, options.offset);

        let delta = allocation_value(&candidate, base) - allocation_value(&current, base);

        let accept = delta < 0.0
            || (temperature > 0.0 && rng.f64() < (-delta / temperature).exp());

        if accept {
            current = candidate;

            if current < best {
                best = current.clone();
            }
        }
    }

    best
}

// Scalar stand-in for the lexicographic order, used for SA deltas.
fn allocation_value(tasks: &TaskAllocation, base: f64) -> f64 {
    tasks
        .tasks()
        .iter()
        .fold(0.0, |acc, &pe| acc * base + pe as f64)
}

#[cfg(test)]
mod tests {
    use super::{
        LocalSearchVariant, ReprMethod, ReprOptions, TaskAllocation, TaskOrbits, min_elem,
    };
    use crate::bsgs::BsgsOptions;
    use crate::perm::{Perm, PermSet};
    use crate::perm_group::PermGroup;

    fn c4_group() -> PermGroup {
        PermGroup::cyclic(4)
    }

    fn d8_group() -> PermGroup {
        let generators = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![2, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap(),
        ])
        .unwrap();

        PermGroup::from_generators(4, generators, &BsgsOptions::default()).unwrap()
    }

    fn repr(
        group: &PermGroup,
        tasks: &[usize],
        method: ReprMethod,
    ) -> TaskAllocation {
        let options = ReprOptions {
            method,
            ..ReprOptions::default()
        };

        min_elem(group, &TaskAllocation::new(tasks.to_vec()), None, &options)
    }

    #[test]
    fn iterate_and_orbits_agree_on_the_dihedral_scenario() {
        let group = d8_group();

        for tasks in [
            vec![1, 1],
            vec![3, 2],
            vec![4, 3],
            vec![2, 2, 4],
            vec![4, 4, 1, 3],
        ] {
            let by_iterate = repr(&group, &tasks, ReprMethod::Iterate);
            let by_orbits = repr(&group, &tasks, ReprMethod::Orbits);

            assert_eq!(by_iterate, by_orbits, "methods disagree on {tasks:?}");
        }
    }

    #[test]
    fn dihedral_representatives_reduce_to_the_first_edge() {
        let group = d8_group();

        assert_eq!(
            repr(&group, &[1, 1], ReprMethod::Orbits).tasks(),
            &[1, 1]
        );
        assert_eq!(
            repr(&group, &[3, 2], ReprMethod::Orbits).tasks(),
            &[1, 2]
        );
        assert_eq!(
            repr(&group, &[4, 3], ReprMethod::Orbits).tasks(),
            &[1, 2]
        );
    }

    #[test]
    fn representatives_are_idempotent_and_in_the_orbit() {
        let group = c4_group();

        for method in [ReprMethod::Iterate, ReprMethod::Orbits] {
            let first = repr(&group, &[3, 1, 2], method);
            let again = repr(&group, first.tasks(), method);

            assert_eq!(first, again);
        }
    }

    #[test]
    fn local_search_stays_in_the_orbit() {
        let group = d8_group();
        let tasks = TaskAllocation::new(vec![4, 3, 4]);

        let exact = repr(&group, tasks.tasks(), ReprMethod::Iterate);

        // collect the whole orbit for containment checks
        let mut orbit = Vec::new();
        for element in &group {
            orbit.push(tasks.permuted(&element, 0));
        }

        for variant in [
            LocalSearchVariant::Bfs,
            LocalSearchVariant::Dfs,
            LocalSearchVariant::SaLinear,
        ] {
            let options = ReprOptions {
                method: ReprMethod::LocalSearch,
                variant,
                invert_generators: true,
                sa_seed: Some(5),
                ..ReprOptions::default()
            };

            let found = min_elem(&group, &tasks, None, &options);

            assert!(orbit.contains(&found), "{variant:?} left the orbit");
            assert!(found <= tasks, "{variant:?} did not improve");
            assert!(found >= exact);
        }
    }

    #[test]
    fn offset_shifts_the_acting_range() {
        let group = c4_group();

        // PEs 5..=8 are acted on, tasks below are untouched
        let options = ReprOptions {
            method: ReprMethod::Iterate,
            offset: 4,
            ..ReprOptions::default()
        };

        let tasks = TaskAllocation::new(vec![7, 2]);
        let result = min_elem(&group, &tasks, None, &options);

        assert_eq!(result.tasks(), &[5, 2]);
    }

    #[test]
    fn match_mode_returns_registered_representatives() {
        let group = c4_group();

        let mut orbits = TaskOrbits::new();
        orbits.insert(TaskAllocation::new(vec![2, 3]));

        let options = ReprOptions {
            method: ReprMethod::Orbits,
            ..ReprOptions::default()
        };

        // [3, 4] is in the orbit of [2, 3]; with match mode the registered
        // representative short-circuits the lexicographic minimum [1, 2]
        let matched = min_elem(
            &group,
            &TaskAllocation::new(vec![3, 4]),
            Some(&orbits),
            &options,
        );
        assert_eq!(matched.tasks(), &[2, 3]);

        // without match mode the true minimum wins
        let unmatched = min_elem(
            &group,
            &TaskAllocation::new(vec![3, 4]),
            Some(&orbits),
            &ReprOptions {
                match_reprs: false,
                ..options
            },
        );
        assert_eq!(unmatched.tasks(), &[1, 2]);
    }

    #[test]
    fn task_orbits_deduplicate_equivalent_allocations() {
        let mut orbits = TaskOrbits::new();

        let (new1, class1) = orbits.insert(TaskAllocation::new(vec![1, 2]));
        let (new2, class2) = orbits.insert(TaskAllocation::new(vec![1, 3]));
        let (new3, class3) = orbits.insert(TaskAllocation::new(vec![1, 2]));

        assert!(new1 && new2);
        assert!(!new3);
        assert_eq!(class1, class3);
        assert_ne!(class1, class2);
        assert_eq!(orbits.num_orbits(), 2);
    }
}
