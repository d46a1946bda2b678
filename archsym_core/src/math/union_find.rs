/// Disjoint sets of `0..n` with weighted quick-union and path compression.
///
/// Block-system discovery drives this with points `1..=n` and needs to know,
/// for every union that actually merges two sets, which representative was
/// absorbed, so `union` reports both roots.
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(item_count: usize) -> Self {
        UnionFind {
            parent: (0..item_count).collect(),
            size: vec![1; item_count],
        }
    }

    /// The representative of the set `item` belongs to.
    pub fn find(&mut self, item: usize) -> usize {
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // compress the path
        let mut current = item;
        while self.parent[current] != current {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    pub fn set_size(&mut self, item: usize) -> usize {
        let root = self.find(item);
        self.size[root]
    }

    /// Union the sets of `a` and `b`. Returns `(kept, absorbed)` roots if the
    /// sets were distinct, `None` if they already coincided. The larger set's
    /// representative is kept.
    pub fn union(&mut self, a: usize, b: usize) -> Option<(usize, usize)> {
        let ra = self.find(a);
        let rb = self.find(b);

        if ra == rb {
            return None;
        }

        let (kept, absorbed) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };

        self.parent[absorbed] = kept;
        self.size[kept] += self.size[absorbed];

        Some((kept, absorbed))
    }
}

#[cfg(test)]
mod tests {
    use super::UnionFind;

    #[test]
    fn merges_and_finds() {
        let mut uf = UnionFind::new(6);

        assert_eq!(uf.find(3), 3);
        assert!(uf.union(0, 1).is_some());
        assert!(uf.union(1, 2).is_some());
        assert!(uf.union(0, 2).is_none());

        assert_eq!(uf.find(2), uf.find(0));
        assert_eq!(uf.set_size(1), 3);
        assert_eq!(uf.set_size(4), 1);
    }

    #[test]
    fn keeps_the_larger_set_representative() {
        let mut uf = UnionFind::new(5);

        uf.union(0, 1);
        let (kept, absorbed) = uf.union(2, 0).unwrap();

        assert_eq!(kept, uf.find(0));
        assert_eq!(absorbed, 2);
    }
}
