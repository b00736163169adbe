// ==========================================
// 车队安全运营系统 - 乐观更新守卫
// ==========================================
// 流程: 快照 S0 -> 立即发布 S1 -> 异步持久化 -> 成功保留 S1 / 失败恢复 S0
// 契约: 持久化失败后,镜像中的实体与操作前完全一致
// 说明: LocalMirror 只是本地镜像,冲突时以存储端返回为准 (reconcile)
// ==========================================

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use tracing::warn;

// ==========================================
// LocalMirror - 本地实体镜像
// ==========================================
/// 按实体ID索引的本地状态
///
/// 每次变更递增 revision,观察方可据此判断是否需要重新渲染
pub struct LocalMirror<V> {
    entries: Mutex<HashMap<String, V>>,
    revision: AtomicU64,
}

impl<V: Clone> LocalMirror<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            revision: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        // 镜像只保存可丢弃的副本, 锁中毒时继续使用内部数据
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// 读取实体
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// 写入实体, 返回旧值
    pub fn upsert(&self, key: &str, value: V) -> Option<V> {
        let previous = self.lock().insert(key.to_string(), value);
        self.bump();
        previous
    }

    /// 移除实体
    pub fn remove(&self, key: &str) -> Option<V> {
        let previous = self.lock().remove(key);
        if previous.is_some() {
            self.bump();
        }
        previous
    }

    /// 用存储端返回的状态覆盖本地镜像
    pub fn reconcile(&self, key: &str, authoritative: V) {
        self.upsert(key, authoritative);
    }

    /// 用存储端全量结果替换镜像
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut guard = self.lock();
        guard.clear();
        guard.extend(entries);
        drop(guard);
        self.bump();
    }

    pub fn values(&self) -> Vec<V> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 当前变更版本号
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// 恢复到快照 (None 表示操作前不存在)
    fn restore(&self, key: &str, snapshot: Option<V>) {
        match snapshot {
            Some(value) => {
                self.upsert(key, value);
            }
            None => {
                self.remove(key);
            }
        }
    }
}

impl<V: Clone> Default for LocalMirror<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// KeyedLocks - 按实体串行化
// ==========================================
/// 同一实体的受保护变更依次执行
///
/// 写入整条记录的变更 (如打卡列表) 必须从已确认状态派生 S1,
/// 否则失败变更的暂定状态会被并发变更一并写入存储
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取实体锁; 守卫释放前同一 key 的其他调用方等待
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // 无人持有或等待的锁可回收
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// 当前登记的 key 数 (持有或等待中)
    pub fn active_keys(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|l| Arc::strong_count(l) > 1)
            .count()
    }
}

// ==========================================
// OptimisticUpdateGuard
// ==========================================
/// 单实体乐观更新守卫
///
/// 未提交即被丢弃时 (例如持久化 future 被取消) 自动恢复快照
pub struct OptimisticUpdateGuard<'m, V: Clone> {
    mirror: &'m LocalMirror<V>,
    key: String,
    snapshot: Option<Option<V>>,
}

impl<'m, V: Clone> OptimisticUpdateGuard<'m, V> {
    /// 捕获 S0 并立即发布 S1
    pub fn begin(mirror: &'m LocalMirror<V>, key: &str, tentative: V) -> Self {
        let previous = mirror.upsert(key, tentative);
        Self {
            mirror,
            key: key.to_string(),
            snapshot: Some(previous),
        }
    }

    /// 操作前状态
    pub fn snapshot(&self) -> Option<&V> {
        self.snapshot.as_ref().and_then(|s| s.as_ref())
    }

    /// 提交: 保留 S1
    pub fn commit(mut self) {
        self.snapshot = None;
    }

    /// 提交并以存储端结果覆盖
    pub fn commit_with(mut self, authoritative: V) {
        self.snapshot = None;
        self.mirror.reconcile(&self.key, authoritative);
    }

    /// 回滚: 恢复 S0
    pub fn revert(mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.mirror.restore(&self.key, snapshot);
        }
    }

    /// 执行一次受保护的变更
    ///
    /// # 参数
    /// - `mirror`: 本地镜像
    /// - `key`: 实体ID
    /// - `tentative`: 暂定新状态 S1
    /// - `persist`: 持久化调用
    ///
    /// # 返回
    /// - Ok(T): 持久化成功, 镜像保留 S1
    /// - Err(E): 持久化失败, 镜像已恢复为 S0
    pub async fn run<T, E, Fut>(
        mirror: &'m LocalMirror<V>,
        key: &str,
        tentative: V,
        persist: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let guard = Self::begin(mirror, key, tentative);
        match persist.await {
            Ok(value) => {
                guard.commit();
                Ok(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "持久化失败, 回滚本地状态");
                guard.revert();
                Err(e)
            }
        }
    }
}

impl<V: Clone> Drop for OptimisticUpdateGuard<'_, V> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.mirror.restore(&self.key, snapshot);
        }
    }
}
