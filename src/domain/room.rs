// ==========================================
// 租屋管理系统 - 房间配置领域模型
// ==========================================
// 房间清单与独立/分摊划分是配置，不是常量
// 顺序即输出顺序（canonical order）
// ==========================================

use crate::domain::types::RoomKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// 参考部署的房间清单（1A/1B 独立，其余分摊）
pub const DEFAULT_EXCLUSIVE_ROOMS: &[&str] = &["1A", "1B"];
pub const DEFAULT_SHARED_ROOMS: &[&str] = &[
    "2A", "2B", "3A", "3B", "3C", "3D", "4A", "4B", "4C", "4D",
];

// ==========================================
// RoomSpec - 单个房间配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub room: String,   // 房号
    pub kind: RoomKind, // 独立 / 分摊
}

impl RoomSpec {
    pub fn new(room: impl Into<String>, kind: RoomKind) -> Self {
        Self {
            room: room.into(),
            kind,
        }
    }
}

/// 房间配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoomLayoutError {
    #[error("房间清单为空")]
    Empty,

    #[error("房号不能为空 (位置 {0})")]
    BlankRoomId(usize),

    #[error("房号重复: {0}")]
    DuplicateRoom(String),

    #[error("至少需要一个分摊房间，否则无法分摊公用电")]
    NoSharedRooms,
}

// ==========================================
// RoomLayout - 房间配置
// ==========================================
/// 房间清单（构造时校验，之后只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RoomSpec>", into = "Vec<RoomSpec>")]
pub struct RoomLayout {
    rooms: Vec<RoomSpec>,
}

impl RoomLayout {
    /// 创建房间配置
    ///
    /// # 校验
    /// - 清单非空
    /// - 房号非空且不重复（按 trim 后比较）
    /// - 至少一个分摊房间
    pub fn new(rooms: Vec<RoomSpec>) -> Result<Self, RoomLayoutError> {
        if rooms.is_empty() {
            return Err(RoomLayoutError::Empty);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rooms.len());
        for (idx, spec) in rooms.into_iter().enumerate() {
            let room = spec.room.trim().to_string();
            if room.is_empty() {
                return Err(RoomLayoutError::BlankRoomId(idx));
            }
            if !seen.insert(room.clone()) {
                return Err(RoomLayoutError::DuplicateRoom(room));
            }
            normalized.push(RoomSpec::new(room, spec.kind));
        }

        if !normalized.iter().any(|s| s.kind == RoomKind::Shared) {
            return Err(RoomLayoutError::NoSharedRooms);
        }

        Ok(Self { rooms: normalized })
    }

    /// 由独立房间 + 分摊房间两组房号构造（独立房间在前）
    pub fn from_groups(exclusive: &[&str], shared: &[&str]) -> Result<Self, RoomLayoutError> {
        let rooms = exclusive
            .iter()
            .map(|r| RoomSpec::new(*r, RoomKind::Exclusive))
            .chain(shared.iter().map(|r| RoomSpec::new(*r, RoomKind::Shared)))
            .collect();
        Self::new(rooms)
    }

    /// 全部房间（按输出顺序）
    pub fn rooms(&self) -> &[RoomSpec] {
        &self.rooms
    }

    /// 查询房间分类
    pub fn kind_of(&self, room: &str) -> Option<RoomKind> {
        self.rooms.iter().find(|s| s.room == room).map(|s| s.kind)
    }

    pub fn contains(&self, room: &str) -> bool {
        self.kind_of(room).is_some()
    }

    /// 分摊房间房号
    pub fn shared_rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms_of(RoomKind::Shared)
    }

    /// 独立房间房号
    pub fn exclusive_rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms_of(RoomKind::Exclusive)
    }

    /// 分摊房间总数（公用电除数）
    pub fn shared_count(&self) -> usize {
        self.shared_rooms().count()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn rooms_of(&self, kind: RoomKind) -> impl Iterator<Item = &str> {
        self.rooms
            .iter()
            .filter(move |s| s.kind == kind)
            .map(|s| s.room.as_str())
    }
}

impl Default for RoomLayout {
    /// 参考部署: 2 间独立 + 10 间分摊
    fn default() -> Self {
        let rooms = DEFAULT_EXCLUSIVE_ROOMS
            .iter()
            .map(|r| RoomSpec::new(*r, RoomKind::Exclusive))
            .chain(
                DEFAULT_SHARED_ROOMS
                    .iter()
                    .map(|r| RoomSpec::new(*r, RoomKind::Shared)),
            )
            .collect();
        Self { rooms }
    }
}

impl TryFrom<Vec<RoomSpec>> for RoomLayout {
    type Error = RoomLayoutError;

    fn try_from(rooms: Vec<RoomSpec>) -> Result<Self, Self::Error> {
        Self::new(rooms)
    }
}

impl From<RoomLayout> for Vec<RoomSpec> {
    fn from(layout: RoomLayout) -> Self {
        layout.rooms
    }
}
