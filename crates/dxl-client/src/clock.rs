//! 时间源抽象
//!
//! 收敛轮询的超时预算和周期间隔都通过 [`Clock`] 计量，
//! 测试中用 [`ManualClock`] 让时间只在 `sleep` 时前进。

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 单调时钟 + 阻塞等待
pub trait Clock {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// 真实时钟
///
/// 使用 `spin_sleep` 获得亚毫秒级的等待精度（轮询间隔通常只有 10ms）。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        spin_sleep::sleep(duration);
    }
}

/// 虚拟时钟
///
/// `sleep` 立即返回并把虚拟时间推进相应时长。克隆共享同一时间线。
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    slept: Duration,
    sleeps: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                slept: Duration::ZERO,
                sleeps: 0,
            })),
        }
    }

    /// 手动推进时间（不计入 sleep 统计）
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// 累计的 sleep 时长
    pub fn total_slept(&self) -> Duration {
        self.inner.lock().slept
    }

    /// sleep 调用次数
    pub fn sleep_count(&self) -> u32 {
        self.inner.lock().sleeps
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.inner.lock();
        state.now += duration;
        state.slept += duration;
        state.sleeps += 1;
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
