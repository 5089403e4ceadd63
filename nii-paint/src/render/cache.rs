use std::collections::{BTreeMap, HashMap};

use crate::Size;

/// 缓存键: 切片索引与输出尺寸 `(宽, 高)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// 切片索引.
    pub slice: usize,

    /// 输出尺寸.
    pub size: Size,
}

/// 容量有限的切片渲染缓存, 严格 LRU 淘汰.
///
/// 每次命中或插入都会刷新该条目的时间戳; 插入新条目前若已满,
/// 则淘汰时间戳最小的条目. 时间戳单调递增, 淘汰顺序完全确定.
#[derive(Debug, Clone)]
pub struct SliceCache<V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<CacheKey, (V, u64)>,
    order: BTreeMap<u64, CacheKey>,
    hits: u64,
    misses: u64,
}

impl<V> SliceCache<V> {
    /// 创建容量为 `capacity` 的缓存. 容量至少为 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tick: 0,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// 容量.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前条目个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否缓存了 `(slice, size)`? 不影响 LRU 顺序.
    #[inline]
    pub fn contains(&self, slice: usize, size: Size) -> bool {
        self.entries.contains_key(&CacheKey { slice, size })
    }

    /// 累计 `(命中, 未命中)` 次数.
    #[inline]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// 获取 `(slice, size)` 的缓存值. 未命中时调用 `render(slice, size)` 生成并缓存.
    pub fn get_or_render<F>(&mut self, slice: usize, size: Size, render: F) -> &V
    where
        F: FnOnce(usize, Size) -> V,
    {
        let key = CacheKey { slice, size };
        self.tick += 1;
        let tick = self.tick;

        if let Some((_, last)) = self.entries.get_mut(&key) {
            self.order.remove(&*last);
            *last = tick;
            self.order.insert(tick, key);
            self.hits += 1;
        } else {
            self.misses += 1;
            let value = render(slice, size);
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            self.entries.insert(key, (value, tick));
            self.order.insert(tick, key);
        }
        &self.entries[&key].0
    }

    /// 淘汰最久未使用的条目.
    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            self.entries.remove(&key);
            log::debug!("Evicted slice {} at {:?}", key.slice, key.size);
        }
    }

    /// 删除切片 `slice` 在任意输出尺寸下的所有条目. 返回删除的个数.
    pub fn invalidate(&mut self, slice: usize) -> usize {
        let stale: Vec<(CacheKey, u64)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.slice == slice)
            .map(|(key, (_, tick))| (*key, *tick))
            .collect();
        for (key, tick) in stale.iter() {
            self.entries.remove(key);
            self.order.remove(tick);
        }
        stale.len()
    }

    /// 删除所有条目.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::SliceCache;
    use std::cell::Cell;

    #[test]
    fn test_hit_does_not_render() {
        let calls = Cell::new(0);
        let render = |z: usize, (w, _): (u32, u32)| {
            calls.set(calls.get() + 1);
            z * 1000 + w as usize
        };
        let mut cache = SliceCache::new(4);
        assert_eq!(*cache.get_or_render(3, (10, 10), render), 3010);
        assert_eq!(*cache.get_or_render(3, (10, 10), render), 3010);
        assert_eq!(*cache.get_or_render(3, (20, 10), render), 3020);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.stats(), (1, 2));
    }

    #[test]
    fn test_strict_lru_eviction() {
        let mut cache = SliceCache::new(2);
        cache.get_or_render(0, (1, 1), |z, _| z);
        cache.get_or_render(1, (1, 1), |z, _| z);
        // 访问 0, 使 1 成为最久未使用.
        cache.get_or_render(0, (1, 1), |_, _| unreachable!());
        cache.get_or_render(2, (1, 1), |z, _| z);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0, (1, 1)));
        assert!(!cache.contains(1, (1, 1)));
        assert!(cache.contains(2, (1, 1)));
    }

    #[test]
    fn test_invalidate_all_sizes() {
        let mut cache = SliceCache::new(10);
        cache.get_or_render(5, (100, 100), |_, _| "old");
        cache.get_or_render(5, (200, 100), |_, _| "old");
        cache.get_or_render(6, (100, 100), |_, _| "keep");
        assert_eq!(cache.invalidate(5), 2);
        assert_eq!(cache.invalidate(5), 0);
        assert_eq!(*cache.get_or_render(5, (100, 100), |_, _| "new"), "new");
        assert_eq!(*cache.get_or_render(6, (100, 100), |_, _| "bad"), "keep");
    }

    #[test]
    fn test_capacity_at_least_one() {
        let mut cache = SliceCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_render(0, (1, 1), |z, _| z);
        cache.get_or_render(1, (1, 1), |z, _| z);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(1, (1, 1)));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_order_stays_in_sync_after_invalidate() {
        let mut cache = SliceCache::new(2);
        cache.get_or_render(0, (1, 1), |z, _| z);
        cache.get_or_render(1, (1, 1), |z, _| z);
        cache.invalidate(0);
        cache.get_or_render(2, (1, 1), |z, _| z);
        // 未满, 不应淘汰 1.
        assert!(cache.contains(1, (1, 1)));
        cache.get_or_render(3, (1, 1), |z, _| z);
        assert!(!cache.contains(1, (1, 1)));
        assert_eq!(cache.len(), 2);
    }
}
