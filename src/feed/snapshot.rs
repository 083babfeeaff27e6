//! ステータススナップショット型定義

use crate::feed::jitter::JitterSource;
use crate::roster::{NodeDescriptor, Roster, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 1ノード分の表示用ステータス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// ノードID
    pub id: String,
    /// 表示名
    pub display_name: String,
    /// 地域クラスタ名
    pub region: String,
    /// 表示ティア
    pub tier: Tier,
    /// 擬似pingの下限値（ms）
    pub base_latency_ms: u32,
    /// 現在の表示レイテンシ（ms）
    pub current_latency_ms: u32,
}

impl NodeStatus {
    /// 記述子と表示レイテンシから作成
    pub fn from_descriptor(node: &NodeDescriptor, current_latency_ms: u32) -> Self {
        Self {
            id: node.id.clone(),
            display_name: node.display_name.clone(),
            region: node.region.clone(),
            tier: node.tier,
            base_latency_ms: node.base_latency_ms,
            current_latency_ms,
        }
    }
}

/// フィードが公開する不変スナップショット
///
/// ティックごとに丸ごと置き換えられ、部分更新されることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// 公開元フィードのID
    pub feed_id: Uuid,
    /// 世代番号（0 = 初回ティック前）
    pub generation: u64,
    /// 公開時刻
    pub published_at: DateTime<Utc>,
    /// 名簿順のノードステータス
    pub nodes: Vec<NodeStatus>,
}

impl StatusSnapshot {
    /// 初回ティック前のスナップショット（全ノードが下限値を表示）
    pub fn initial(feed_id: Uuid, roster: &Roster) -> Self {
        Self {
            feed_id,
            generation: 0,
            published_at: Utc::now(),
            nodes: roster
                .iter()
                .map(|node| NodeStatus::from_descriptor(node, node.base_latency_ms))
                .collect(),
        }
    }

    /// ID でノードステータスを検索
    pub fn node(&self, id: &str) -> Option<&NodeStatus> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// 指定ノードの表示レイテンシ
    pub fn latency_of(&self, id: &str) -> Option<u32> {
        self.node(id).map(|n| n.current_latency_ms)
    }
}

/// 1ティック分の再計算
///
/// 各ノードの表示レイテンシを `base + offset(0..=max_jitter_ms)` で求め、
/// それ以外のフィールドはそのまま引き継ぎます。
pub fn next_snapshot(
    feed_id: Uuid,
    roster: &Roster,
    previous_generation: u64,
    max_jitter_ms: u32,
    jitter: &mut dyn JitterSource,
) -> StatusSnapshot {
    let nodes = roster
        .iter()
        .map(|node| {
            let offset = jitter.offset(max_jitter_ms).min(max_jitter_ms);
            NodeStatus::from_descriptor(node, node.base_latency_ms.saturating_add(offset))
        })
        .collect();

    StatusSnapshot {
        feed_id,
        generation: previous_generation + 1,
        published_at: Utc::now(),
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::jitter::{FixedJitter, RandomJitter};
    use crate::roster::NodeDescriptor;

    fn two_node_roster() -> Roster {
        Roster::new(vec![
            NodeDescriptor::new("bj", "北京 BGP", "华北枢纽", 8, Tier::Optimal),
            NodeDescriptor::new("sh", "上海 10G", "华东枢纽", 12, Tier::Optimal),
        ])
        .unwrap()
    }

    #[test]
    fn test_initial_snapshot_uses_base_latency() {
        let roster = two_node_roster();
        let snapshot = StatusSnapshot::initial(Uuid::new_v4(), &roster);

        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.latency_of("bj"), Some(8));
        assert_eq!(snapshot.latency_of("sh"), Some(12));
        assert!(snapshot
            .nodes
            .iter()
            .all(|n| n.current_latency_ms == n.base_latency_ms));
    }

    #[test]
    fn test_next_snapshot_bounds() {
        let roster = Roster::reference();
        let mut jitter = RandomJitter::seeded(7);
        let mut generation = 0;

        for _ in 0..500 {
            let snapshot = next_snapshot(Uuid::nil(), &roster, generation, 2, &mut jitter);
            for (status, node) in snapshot.nodes.iter().zip(roster.iter()) {
                assert_eq!(status.id, node.id);
                assert!(status.current_latency_ms >= node.base_latency_ms);
                assert!(status.current_latency_ms <= node.base_latency_ms + 2);
            }
            generation = snapshot.generation;
        }
        assert_eq!(generation, 500);
    }

    #[test]
    fn test_next_snapshot_carries_fields() {
        let roster = two_node_roster();
        let mut jitter = FixedJitter::new(1);
        let snapshot = next_snapshot(Uuid::nil(), &roster, 3, 2, &mut jitter);

        assert_eq!(snapshot.generation, 4);
        let bj = snapshot.node("bj").unwrap();
        assert_eq!(bj.display_name, "北京 BGP");
        assert_eq!(bj.region, "华北枢纽");
        assert_eq!(bj.tier, Tier::Optimal);
        assert_eq!(bj.current_latency_ms, 9);
        assert_eq!(snapshot.latency_of("sh"), Some(13));
    }

    #[test]
    fn test_out_of_range_jitter_is_clamped() {
        let roster = two_node_roster();
        let mut jitter = FixedJitter::new(50);
        let snapshot = next_snapshot(Uuid::nil(), &roster, 0, 2, &mut jitter);
        assert_eq!(snapshot.latency_of("bj"), Some(10));
        assert_eq!(snapshot.latency_of("sh"), Some(14));
    }

    #[test]
    fn test_snapshot_json_keys() {
        let roster = two_node_roster();
        let snapshot = StatusSnapshot::initial(Uuid::nil(), &roster);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["generation"], 0);
        assert_eq!(value["nodes"][0]["id"], "bj");
        assert_eq!(value["nodes"][0]["currentLatencyMs"], 8);
        assert_eq!(value["nodes"][0]["displayName"], "北京 BGP");
        assert_eq!(value["nodes"][1]["tier"], "optimal");
    }
}
