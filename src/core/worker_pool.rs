//! 工作池：限制同时处理的申请数量
//!
//! 各次申请互不共享可变状态，并发只靠「多个独立调用并行」实现；Semaphore 限制上限。

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::core::AgentError;

/// 固定大小的工作池
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let size = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 获取一个工作许可
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AgentError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AgentError::PoolClosed)
    }

    /// 在池内执行一个任务；许可在任务结束时释放
    pub async fn run<F, T>(&self, job: F) -> Result<T, AgentError>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(job.await)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(10)
    }
}
