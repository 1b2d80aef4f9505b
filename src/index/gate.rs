//! # ReopenGate: 디바운스된 주기적 갱신
//!
//! 고정 주기(기본 180초)마다 인덱스 갱신을 호출하되,
//! 두 갱신이 동시에 실행되는 일은 절대 없게 합니다.
//!
//! ## 알고리즘
//! 1. 카운터를 원자적으로 1 증가
//! 2. 증가 후 값이 1보다 크면(이미 갱신 중) 다시 1 감소하고 바로 반환
//! 3. 아니면 갱신을 실행
//! 4. 갱신이 끝나면(성공/실패/패닉 모두) 1 감소
//!
//! 겹친 틱은 버려집니다. 대기열에 넣거나 나중에 재시도하지 않습니다.
//! 각 틱은 별도 태스크로 실행되므로 갱신이 주기보다 오래 걸려도 타이머는 막히지 않습니다.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 게이트가 호출하는 갱신 연산. 실패 처리는 구현체 책임입니다.
pub trait Refresh: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = ()> + Send;
}

pub struct ReopenGate<R> {
    target: Arc<R>,
    /// 0 = 대기, 1 이상 = 갱신 중
    in_flight: AtomicUsize,
}

impl<R: Refresh> ReopenGate<R> {
    pub fn new(target: Arc<R>) -> Self {
        Self {
            target,
            in_flight: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// 틱 하나를 처리합니다. 실제로 갱신을 실행했으면 `true`.
    pub async fn trigger(&self) -> bool {
        if self.in_flight.fetch_add(1, Ordering::AcqRel) + 1 > 1 {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            tracing::debug!("Index reopen already in progress, skipping tick");
            return false;
        }

        let _release = Release(&self.in_flight);
        self.target.refresh().await;
        true
    }

    /// 주기적 갱신 태스크를 시작합니다. 첫 틱은 즉시 발생합니다.
    pub fn spawn(self: Arc<Self>, period: Duration) -> ReopenTask {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let gate = Arc::clone(&self);
                tokio::spawn(async move {
                    gate.trigger().await;
                });
            }
        });
        ReopenTask { handle }
    }
}

/// 갱신이 어떻게 끝나든(패닉 포함) 카운터를 되돌립니다.
struct Release<'a>(&'a AtomicUsize);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 실행 중인 주기적 갱신 태스크
pub struct ReopenTask {
    handle: JoinHandle<()>,
}

impl ReopenTask {
    /// 타이머를 멈춥니다. 이미 시작된 갱신은 끝까지 실행됩니다.
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}
