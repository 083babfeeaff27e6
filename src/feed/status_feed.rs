//! 擬似ステータスフィード
//!
//! 名簿を所有する周期タスクを1つ起動し、ティックごとに不変スナップショットを
//! `watch` チャンネルへ公開します。表示側はポーリング（`latest`）または購読
//! （`subscribe`）でのみ読み取り、フィードへは生成と停止以外の指示を出しません。

use crate::feed::jitter::{JitterSource, RandomJitter};
use crate::feed::snapshot::{next_snapshot, StatusSnapshot};
use crate::roster::Roster;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// 既定の更新間隔（2.5秒）
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2500);

/// 既定の最大揺らぎ（ms）
pub const DEFAULT_MAX_JITTER_MS: u32 = 2;

/// フィード設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// 更新間隔
    pub interval: Duration,
    /// 最大揺らぎ（ms、両端を含む）
    pub max_jitter_ms: u32,
    /// 乱数シード（指定時は再現可能）
    pub seed: Option<u64>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_jitter_ms: DEFAULT_MAX_JITTER_MS,
            seed: None,
        }
    }
}

impl FeedOptions {
    /// 更新間隔を設定
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 最大揺らぎを設定
    pub fn with_max_jitter_ms(mut self, max_jitter_ms: u32) -> Self {
        self.max_jitter_ms = max_jitter_ms;
        self
    }

    /// 乱数シードを設定
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// 擬似ステータスフィード
///
/// `Drop` 時にも周期タスクを停止するため、タイマーはどの経路でも解放されます。
pub struct StatusFeed {
    id: Uuid,
    roster: Roster,
    options: FeedOptions,
    snapshot_rx: watch::Receiver<Arc<StatusSnapshot>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusFeed {
    /// フィードを開始（tokio ランタイム内で呼び出すこと）
    pub fn start(roster: Roster, options: FeedOptions) -> Self {
        let jitter = RandomJitter::from_seed_option(options.seed);
        Self::start_with_jitter(roster, options, Box::new(jitter))
    }

    /// 揺らぎ生成器を指定してフィードを開始
    pub fn start_with_jitter(
        roster: Roster,
        options: FeedOptions,
        jitter: Box<dyn JitterSource>,
    ) -> Self {
        let id = Uuid::new_v4();
        let initial = Arc::new(StatusSnapshot::initial(id, &roster));
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let cancel = CancellationToken::new();

        let ticker = Ticker {
            feed_id: id,
            roster: roster.clone(),
            interval: options.interval.max(Duration::from_millis(1)),
            max_jitter_ms: options.max_jitter_ms,
            jitter,
            snapshot_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(ticker.run());

        info!(
            feed_id = %id,
            nodes = roster.len(),
            interval_ms = options.interval.as_millis() as u64,
            "📡 Status feed started"
        );

        Self {
            id,
            roster,
            options,
            snapshot_rx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// フィードID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 名簿
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// フィード設定
    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    /// 最新のスナップショットを取得
    pub fn latest(&self) -> Arc<StatusSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// 更新を購読（購読解除は `FeedSubscription` の破棄）
    pub fn subscribe(&self) -> FeedSubscription {
        let mut rx = self.snapshot_rx.clone();
        rx.borrow_and_update();
        FeedSubscription { rx }
    }

    /// 周期タスクが動作中かどうか
    pub fn is_running(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        match self.task.lock() {
            Ok(task) => task.as_ref().is_some_and(|t| !t.is_finished()),
            Err(_) => false,
        }
    }

    /// フィードを停止し、周期タスクの終了を待つ
    ///
    /// 戻った後はスナップショットが公開されることはありません。複数回呼んでも安全です。
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        if let Some(task) = self.take_task() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(feed_id = %self.id, "Status feed task ended abnormally: {}", e);
                }
            }
            info!(feed_id = %self.id, "Status feed stopped");
        }
    }

    /// 同期的に停止（タスクは中断され、終了は待たない）
    pub fn stop(&self) {
        self.cancel.cancel();

        if let Some(task) = self.take_task() {
            task.abort();
            info!(feed_id = %self.id, "Status feed aborted");
        }
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Drop for StatusFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for StatusFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusFeed")
            .field("id", &self.id)
            .field("nodes", &self.roster.len())
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}

/// フィード更新の購読
#[derive(Debug, Clone)]
pub struct FeedSubscription {
    rx: watch::Receiver<Arc<StatusSnapshot>>,
}

impl FeedSubscription {
    /// 次のスナップショットを待つ（フィード停止後は `None`）
    pub async fn changed(&mut self) -> Option<Arc<StatusSnapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// 現在のスナップショット
    pub fn current(&self) -> Arc<StatusSnapshot> {
        self.rx.borrow().clone()
    }

    /// 更新ごとに `on_snapshot` を呼び出す
    ///
    /// `limit` 件処理した時点、フィード停止時、または `shutdown` 完了時に戻ります。
    /// `shutdown` は一度だけ固定されるため、コールバック実行中に完了しても失われません。
    /// 戻り値は処理した件数です。
    pub async fn run_until<S, F, E>(
        &mut self,
        limit: Option<u64>,
        shutdown: S,
        mut on_snapshot: F,
    ) -> Result<u64, E>
    where
        S: Future<Output = ()>,
        F: FnMut(&StatusSnapshot) -> Result<(), E>,
    {
        tokio::pin!(shutdown);
        let mut handled = 0u64;

        loop {
            if limit.is_some_and(|limit| handled >= limit) {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                snapshot = self.changed() => {
                    let Some(snapshot) = snapshot else { break };
                    on_snapshot(&snapshot)?;
                    handled += 1;
                }
            }
        }

        Ok(handled)
    }
}

/// 周期タスク本体（名簿と乱数を排他的に所有）
struct Ticker {
    feed_id: Uuid,
    roster: Roster,
    interval: Duration,
    max_jitter_ms: u32,
    jitter: Box<dyn JitterSource>,
    snapshot_tx: watch::Sender<Arc<StatusSnapshot>>,
    cancel: CancellationToken,
}

impl Ticker {
    async fn run(mut self) {
        // 初回ティックは1周期後（開始直後には発火しない）
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut generation = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = next_snapshot(
                        self.feed_id,
                        &self.roster,
                        generation,
                        self.max_jitter_ms,
                        self.jitter.as_mut(),
                    );

                    for node in &snapshot.nodes {
                        trace!(feed_id = %self.feed_id, node = %node.id, latency_ms = node.current_latency_ms, "node latency");
                    }

                    // 停止済みなら公開しない（判定と書き込みは watch のロック内）
                    let cancel = &self.cancel;
                    let published = self.snapshot_tx.send_if_modified(|current| {
                        if cancel.is_cancelled() {
                            return false;
                        }
                        *current = Arc::new(snapshot);
                        true
                    });
                    if !published {
                        break;
                    }

                    generation += 1;
                    debug!(feed_id = %self.feed_id, generation, "Status snapshot published");
                }
            }
        }

        debug!(feed_id = %self.feed_id, generation, "Status feed ticker exited");
    }
}
