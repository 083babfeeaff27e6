//! リレーノード名簿
//!
//! ステータスフィードが表示するノード一覧を定義します。名簿は起動時に一度だけ
//! 構築され、実行中にノードが追加・削除されることはありません。

use crate::error::{Error, Result};
use crossterm::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// ノードの表示ティア
///
/// 表示上の分類のみで、レイテンシ値からは導出されません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 最適（緑・点滅表示）
    Optimal,
    /// 良好（黄表示）
    Good,
}

impl Tier {
    /// ティア名を取得
    pub fn name(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Good => "good",
        }
    }

    /// ステータスインジケーターの記号
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Optimal => "◉",
            Self::Good => "●",
        }
    }

    /// 表示色
    pub fn color(&self) -> Color {
        match self {
            Self::Optimal => Color::Green,
            Self::Good => Color::Yellow,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// リレーノード（POP）の記述子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// 名簿内で一意な短い識別子
    pub id: String,
    /// 表示名（都市名・回線名など）
    pub display_name: String,
    /// 地域クラスタ名
    pub region: String,
    /// 擬似pingの下限値（ms）
    pub base_latency_ms: u32,
    /// 表示ティア
    pub tier: Tier,
}

impl NodeDescriptor {
    /// 新しい記述子を作成
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        region: impl Into<String>,
        base_latency_ms: u32,
        tier: Tier,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            region: region.into(),
            base_latency_ms,
            tier,
        }
    }
}

/// 固定長・順序付きのノード名簿
///
/// 空でなく、ID が重複しないことが構築時に保証されます。複製は `Arc` を
/// 共有するだけなので、フィードごとに安価に持たせられます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    nodes: Arc<[NodeDescriptor]>,
}

impl Roster {
    /// 名簿を検証して作成
    pub fn new(nodes: Vec<NodeDescriptor>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::InvalidRoster(
                "roster must contain at least one node".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if node.id.trim().is_empty() {
                return Err(Error::InvalidRoster(format!(
                    "node '{}' has an empty id",
                    node.display_name
                )));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(Error::InvalidRoster(format!(
                    "duplicate node id: {}",
                    node.id
                )));
            }
        }

        Ok(Self {
            nodes: nodes.into(),
        })
    }

    /// ランディングページ掲載の既定名簿
    pub fn reference() -> Self {
        let nodes = vec![
            NodeDescriptor::new("bj", "北京 BGP", "华北枢纽", 8, Tier::Optimal),
            NodeDescriptor::new("sh", "上海 10G", "华东枢纽", 12, Tier::Optimal),
            NodeDescriptor::new("sz", "深圳 极速", "华南枢纽", 14, Tier::Optimal),
            NodeDescriptor::new("wh", "武汉", "华中枢纽", 22, Tier::Good),
            NodeDescriptor::new("cd", "成都", "西南枢纽", 30, Tier::Good),
        ];
        Self {
            nodes: nodes.into(),
        }
    }

    /// ID でノードを検索
    pub fn get(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// 名簿順の ID 一覧
    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::reference()
    }
}

impl Deref for Roster {
    type Target = [NodeDescriptor];

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_roster() {
        let roster = Roster::reference();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster.ids(), vec!["bj", "sh", "sz", "wh", "cd"]);
        assert_eq!(roster.get("wh").map(|n| n.tier), Some(Tier::Good));
        assert_eq!(roster.get("bj").map(|n| n.base_latency_ms), Some(8));

        // 既定名簿も検証を通ること
        assert!(Roster::new(roster.to_vec()).is_ok());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = Roster::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoster(_)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let nodes = vec![
            NodeDescriptor::new("bj", "Beijing", "North", 8, Tier::Optimal),
            NodeDescriptor::new("bj", "Beijing 2", "North", 9, Tier::Good),
        ];
        let err = Roster::new(nodes).unwrap_err();
        assert!(err.to_string().contains("duplicate node id: bj"));
    }

    #[test]
    fn test_blank_id_rejected() {
        let nodes = vec![NodeDescriptor::new("  ", "Nowhere", "None", 1, Tier::Good)];
        assert!(Roster::new(nodes).is_err());
    }

    #[test]
    fn test_single_node_roster() {
        let roster =
            Roster::new(vec![NodeDescriptor::new("x", "X", "R", 1, Tier::Good)]).unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster.get("y").is_none());
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&Tier::Optimal).unwrap();
        assert_eq!(json, "\"optimal\"");
        let tier: Tier = serde_json::from_str("\"good\"").unwrap();
        assert_eq!(tier, Tier::Good);
        assert_eq!(tier.to_string(), "good");
    }
}
