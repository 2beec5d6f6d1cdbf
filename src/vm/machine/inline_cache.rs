//! 다형 인라인 캐시
//!
//! 연산자 평가 지점 하나(`BinaryCallSite`)가 최근 본 `(왼쪽 타입, 오른쪽 타입, 세대)` 조합과
//! 그에 대한 `DispatchPlan`을 기억합니다. 용량을 넘는 조합이 들어오면 megamorphic이 되어
//! 이후로는 항상 전체 해석을 거칩니다.
//!
//! 상태는 `ArcSwap`으로 게시되며 읽기는 락이 없습니다. 갱신은 `rcu`로 합니다.

use std::sync::Arc;

use arc_swap::ArcSwap;
use smallvec::SmallVec;
use tracing::debug;

use super::super::slot::SlotKind;
use super::super::type_def::TypeId;
use super::operators::DispatchPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub left: TypeId,
    pub right: TypeId,
    pub left_generation: u64,
    pub right_generation: u64,
}

impl CacheKey {
    fn same_pair(&self, other: &CacheKey) -> bool {
        self.left == other.left && self.right == other.right
    }
}

#[derive(Debug, Clone)]
pub struct CachedPlan {
    pub key: CacheKey,
    pub plan: DispatchPlan,
}

#[derive(Debug, Clone)]
pub enum CacheState {
    /// 비어 있으면 초기 상태, 하나면 monomorphic
    Polymorphic(SmallVec<[CachedPlan; 4]>),
    Megamorphic,
}

impl CacheState {
    fn len(&self) -> usize {
        match self {
            CacheState::Polymorphic(entries) => entries.len(),
            CacheState::Megamorphic => 0,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CacheState::Polymorphic(entries) if entries.is_empty() => "uninitialized",
            CacheState::Polymorphic(entries) if entries.len() == 1 => "monomorphic",
            CacheState::Polymorphic(_) => "polymorphic",
            CacheState::Megamorphic => "megamorphic",
        }
    }
}

/// 이항 연산자 평가 지점
pub struct BinaryCallSite {
    kind: SlotKind,
    state: ArcSwap<CacheState>,
}

impl BinaryCallSite {
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            state: ArcSwap::from_pointee(CacheState::Polymorphic(SmallVec::new())),
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// 키가 정확히 같은 (세대 포함) 계획
    pub fn lookup(&self, key: &CacheKey) -> Option<DispatchPlan> {
        match &**self.state.load() {
            CacheState::Polymorphic(entries) => entries
                .iter()
                .find(|cached| cached.key == *key)
                .map(|cached| cached.plan.clone()),
            CacheState::Megamorphic => None,
        }
    }

    /// 새 계획 기록. 같은 타입 쌍의 낡은 항목은 교체되고,
    /// 서로 다른 쌍이 `capacity`를 넘으면 megamorphic으로 전환
    pub fn record(&self, key: CacheKey, plan: DispatchPlan, capacity: usize) {
        let previous = self.state.rcu(|current| match &**current {
            CacheState::Megamorphic => current.clone(),
            CacheState::Polymorphic(entries) => {
                let mut entries: SmallVec<[CachedPlan; 4]> = entries
                    .iter()
                    .filter(|cached| !cached.key.same_pair(&key))
                    .cloned()
                    .collect();
                if entries.len() >= capacity {
                    return Arc::new(CacheState::Megamorphic);
                }
                entries.push(CachedPlan {
                    key,
                    plan: plan.clone(),
                });
                Arc::new(CacheState::Polymorphic(entries))
            }
        });

        let current = self.state.load();
        let (from, to) = (previous.label(), current.label());
        if from != to {
            debug!(
                kind = self.kind.name(),
                from,
                to,
                entries = current.len(),
                "inline cache transition"
            );
        }
    }

    pub fn is_megamorphic(&self) -> bool {
        matches!(**self.state.load(), CacheState::Megamorphic)
    }

    /// 기억하고 있는 타입 쌍 개수
    pub fn len(&self) -> usize {
        self.state.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for BinaryCallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryCallSite")
            .field("kind", &self.kind)
            .field("state", &self.state.load().label())
            .finish()
    }
}
