//! 按 IP 串行的设备命令队列。
//!
//! 控制器无法同时处理多个请求，同一 IP 的读写必须一个接一个执行：
//! - 同一 IP 的操作按提交顺序（调用 `enqueue` 的时刻）执行，前一个结束后才开始下一个
//! - 不同 IP 之间互不等待
//! - 空 IP 不排队
//!
//! 每个 IP 只保存队尾的完成信号；操作结束时如果自己仍是队尾，就移除该 IP 的记录。

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

struct ChainTail {
    id: u64,
    done: oneshot::Receiver<()>,
}

type Chains = Arc<Mutex<HashMap<String, ChainTail>>>;

/// 设备命令队列。克隆后共享同一组队列。
#[derive(Clone, Default)]
pub struct DeviceQueue {
    chains: Chains,
    next_id: Arc<AtomicU64>,
}

impl DeviceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将 `op` 排入 `ip` 的队列。
    ///
    /// 排队位置在调用时确定，返回的 future 被 await 时才真正等待并执行。
    pub fn enqueue<F, Fut, T>(&self, ip: &str, op: F) -> impl Future<Output = T> + Send + use<F, Fut, T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
        T: Send,
    {
        let key = ip.trim();
        let turn = if key.is_empty() {
            None
        } else {
            Some(self.register(key))
        };

        async move {
            let Some(mut turn) = turn else {
                return op().await;
            };
            if let Some(previous) = turn.previous.as_mut() {
                let _ = previous.await;
            }
            turn.previous = None;
            let output = op().await;
            drop(turn);
            output
        }
    }

    /// 当前仍有排队记录的 IP 数量。
    pub fn pending_keys(&self) -> usize {
        lock(&self.chains).len()
    }

    fn register(&self, key: &str) -> Turn {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();
        let previous = lock(&self.chains)
            .insert(key.to_string(), ChainTail { id, done: done_rx })
            .map(|tail| tail.done);
        Turn {
            chains: Arc::clone(&self.chains),
            key: key.to_string(),
            id,
            previous,
            done: Some(done_tx),
        }
    }
}

fn lock(chains: &Chains) -> std::sync::MutexGuard<'_, HashMap<String, ChainTail>> {
    match chains.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// 队列中的一个位置；drop 时通知后继并在必要时清理记录。
struct Turn {
    chains: Chains,
    key: String,
    id: u64,
    previous: Option<oneshot::Receiver<()>>,
    done: Option<oneshot::Sender<()>>,
}

impl Drop for Turn {
    fn drop(&mut self) {
        let Some(done) = self.done.take() else {
            return;
        };
        if let (Some(previous), Ok(handle)) =
            (self.previous.take(), tokio::runtime::Handle::try_current())
        {
            // 还没轮到就被取消：前驱结束前本位置仍是队列的一环，
            // 放行后继与清理记录都交给转发任务。
            let chains = Arc::clone(&self.chains);
            let key = std::mem::take(&mut self.key);
            let id = self.id;
            handle.spawn(async move {
                let _ = previous.await;
                let _ = done.send(());
                release_tail(&chains, &key, id);
            });
            return;
        }
        let _ = done.send(());
        release_tail(&self.chains, &self.key, self.id);
    }
}

fn release_tail(chains: &Chains, key: &str, id: u64) {
    let mut chains = lock(chains);
    if chains.get(key).is_some_and(|tail| tail.id == id) {
        chains.remove(key);
    }
}
