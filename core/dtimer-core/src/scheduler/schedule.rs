//! Schedule — sorted map from wakeup time to pending events
//!
//! 시간 → 이벤트 목록 (도착 순서 유지)

use super::event::EventId;
use crate::error::TimerResult;
use crate::storage::{StoreVariant, decode_u64_key, u64_key};

/// 스케줄 테이블 이름
pub const SCHEDULE_TABLE: &str = "schedule";

/// 스케줄
///
/// 키는 big-endian `u64` 시간이므로 백엔드의 정렬 순서가 곧 시간 순서입니다.
/// `first_key`와 `drain_up_to`는 범위 스캔만 사용하며 전체를 순회하지 않습니다.
#[derive(Clone)]
pub struct Schedule {
    store: StoreVariant,
}

impl Schedule {
    pub fn new(store: StoreVariant) -> Self {
        Self { store }
    }

    /// 특정 시간의 이벤트 목록
    pub fn get(&self, time: u64) -> TimerResult<Option<Vec<EventId>>> {
        self.store
            .get(SCHEDULE_TABLE, &u64_key(time))?
            .map(|bytes| bincode::deserialize(&bytes).map_err(Into::into))
            .transpose()
    }

    fn put(&self, time: u64, events: &[EventId]) -> TimerResult<()> {
        let bytes = bincode::serialize(events)?;
        self.store.insert(SCHEDULE_TABLE, &u64_key(time), &bytes)
    }

    /// 이벤트 추가 (목록 끝에)
    pub fn insert(&self, time: u64, event: EventId) -> TimerResult<()> {
        let mut events = self.get(time)?.unwrap_or_default();
        events.push(event);
        self.put(time, &events)
    }

    /// 이벤트 제거: 없으면 무시, 목록이 비면 키 삭제
    pub fn remove(&self, time: u64, event: EventId) -> TimerResult<()> {
        let Some(events) = self.get(time)? else {
            return Ok(());
        };
        let remaining: Vec<EventId> = events.iter().copied().filter(|e| *e != event).collect();
        if remaining.is_empty() {
            self.store.delete(SCHEDULE_TABLE, &u64_key(time))?;
        } else if remaining.len() < events.len() {
            self.put(time, &remaining)?;
        }
        Ok(())
    }

    /// 가장 이른 시간
    pub fn first_key(&self) -> TimerResult<Option<u64>> {
        self.store
            .scan_one(SCHEDULE_TABLE, ..)?
            .map(|(key, _)| decode_u64_key(&key))
            .transpose()
    }

    /// `time` 이하의 모든 항목을 제거하고 (시간, 이벤트) 순서대로 반환
    pub fn drain_up_to(&self, time: u64) -> TimerResult<Vec<(u64, EventId)>> {
        let due = self.store.scan(SCHEDULE_TABLE, ..=u64_key(time))?;
        let mut ready = Vec::new();
        for (key, value) in due {
            let at = decode_u64_key(&key)?;
            let events: Vec<EventId> = bincode::deserialize(&value)?;
            ready.extend(events.into_iter().map(|e| (at, e)));
            self.store.delete(SCHEDULE_TABLE, &key)?;
        }
        Ok(ready)
    }

    pub fn is_empty(&self) -> TimerResult<bool> {
        Ok(self.first_key()?.is_none())
    }

    /// 스케줄된 시간 키 개수
    pub fn len(&self) -> TimerResult<usize> {
        self.store.count(SCHEDULE_TABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    const A: EventId = EventId(1);
    const B: EventId = EventId(2);
    const C: EventId = EventId(3);
    const D: EventId = EventId(4);

    fn schedule() -> Schedule {
        Schedule::new(StoreVariant::in_memory())
    }

    #[test]
    fn test_insert_and_drain() {
        let s = schedule();
        s.insert(10, A).unwrap();
        s.insert(30, B).unwrap();
        s.insert(20, C).unwrap();
        s.insert(30, D).unwrap();

        assert_eq!(s.first_key().unwrap(), Some(10));
        assert_eq!(s.drain_up_to(25).unwrap(), vec![(10, A), (20, C)]);
        assert_eq!(s.first_key().unwrap(), Some(30));
        assert_eq!(s.get(30).unwrap(), Some(vec![B, D]));
        assert_eq!(s.len().unwrap(), 1);
    }

    #[test]
    fn test_drain_boundaries() {
        let s = schedule();
        s.insert(10, A).unwrap();
        s.insert(20, B).unwrap();

        assert!(s.drain_up_to(5).unwrap().is_empty());
        assert_eq!(s.drain_up_to(10).unwrap(), vec![(10, A)]);
        assert!(s.drain_up_to(10).unwrap().is_empty());
        assert_eq!(s.drain_up_to(35).unwrap(), vec![(20, B)]);
        assert_eq!(s.first_key().unwrap(), None);
        assert!(s.drain_up_to(40).unwrap().is_empty());
    }

    #[test]
    fn test_remove() {
        let s = schedule();
        s.insert(50, A).unwrap();
        s.insert(50, B).unwrap();
        s.insert(60, C).unwrap();

        s.remove(50, A).unwrap();
        assert_eq!(s.get(50).unwrap(), Some(vec![B]));

        // 없는 이벤트/시간 제거는 무시
        s.remove(50, D).unwrap();
        s.remove(55, A).unwrap();
        assert_eq!(s.get(50).unwrap(), Some(vec![B]));

        s.remove(50, B).unwrap();
        assert_eq!(s.get(50).unwrap(), None);
        assert_eq!(s.first_key().unwrap(), Some(60));
    }

    #[test]
    fn test_large_times_sort_numerically() {
        let s = schedule();
        s.insert(256, A).unwrap();
        s.insert(255, B).unwrap();
        s.insert(u64::MAX, C).unwrap();
        assert_eq!(s.first_key().unwrap(), Some(255));
        assert_eq!(s.drain_up_to(300).unwrap(), vec![(255, B), (256, A)]);
        assert_eq!(s.first_key().unwrap(), Some(u64::MAX));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u64, u64),
        Remove(u64, u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..50, 0u64..8).prop_map(|(t, e)| Op::Insert(t, e)),
            (0u64..50, 0u64..8).prop_map(|(t, e)| Op::Remove(t, e)),
        ]
    }

    proptest! {
        #[test]
        fn prop_schedule_matches_model(ops in prop::collection::vec(op(), 0..60), upto in 0u64..60) {
            let s = schedule();
            let mut model: BTreeMap<u64, Vec<EventId>> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(t, e) => {
                        s.insert(t, EventId(e)).unwrap();
                        model.entry(t).or_default().push(EventId(e));
                    }
                    Op::Remove(t, e) => {
                        s.remove(t, EventId(e)).unwrap();
                        if let Some(list) = model.get_mut(&t) {
                            list.retain(|x| *x != EventId(e));
                            if list.is_empty() {
                                model.remove(&t);
                            }
                        }
                    }
                }
                prop_assert_eq!(s.first_key().unwrap(), model.keys().next().copied());
            }

            let expected: Vec<(u64, EventId)> = model
                .range(..=upto)
                .flat_map(|(t, list)| list.iter().map(move |e| (*t, *e)))
                .collect();
            prop_assert_eq!(s.drain_up_to(upto).unwrap(), expected);
            prop_assert_eq!(s.first_key().unwrap(), model.range(upto + 1..).next().map(|(t, _)| *t));
        }
    }
}
