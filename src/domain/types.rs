// ==========================================
// 租屋管理系统 - 领域类型定义
// ==========================================
// 房间分类 / 缴费状态 / 缴费方式
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 房间分类 (Room Kind)
// ==========================================
// 独立房间只付自己电表的度数；分摊房间另外平均分摊公用电
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Exclusive, // 独立计费
    Shared,    // 分摊公用电
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Exclusive => write!(f, "EXCLUSIVE"),
            RoomKind::Shared => write!(f, "SHARED"),
        }
    }
}

impl RoomKind {
    /// 从字符串解析房间分类
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EXCLUSIVE" => Some(RoomKind::Exclusive),
            "SHARED" => Some(RoomKind::Shared),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomKind::Exclusive => "EXCLUSIVE",
            RoomKind::Shared => "SHARED",
        }
    }
}

// ==========================================
// 缴费状态 (Payment Status)
// ==========================================
// 生命周期: UNPAID → PARTIAL → PAID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,  // 未缴
    Partial, // 部分缴
    Paid,    // 已缴
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PaymentStatus {
    /// 从字符串解析缴费状态（未知值视为未缴）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PAID" => PaymentStatus::Paid,
            "PARTIAL" => PaymentStatus::Partial,
            _ => PaymentStatus::Unpaid,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Paid => "PAID",
        }
    }

    /// 按已缴金额推导状态
    ///
    /// # 规则
    /// - paid ≤ 0 → UNPAID
    /// - 0 < paid < due → PARTIAL
    /// - paid ≥ due → PAID（应缴为 0 时也视为已缴清）
    pub fn derive(due: i64, paid: i64) -> Self {
        if paid >= due {
            PaymentStatus::Paid
        } else if paid <= 0 {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }
}

// ==========================================
// 租金缴费方式 (Payment Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Monthly,    // 月缴
    SemiAnnual, // 半年缴
    Annual,     // 年缴
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Monthly => write!(f, "MONTHLY"),
            PaymentMethod::SemiAnnual => write!(f, "SEMI_ANNUAL"),
            PaymentMethod::Annual => write!(f, "ANNUAL"),
        }
    }
}

impl PaymentMethod {
    /// 从字符串解析缴费方式（兼容中文标签）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "月繳" | "月缴" => return Some(PaymentMethod::Monthly),
            "半年繳" | "半年缴" => return Some(PaymentMethod::SemiAnnual),
            "年繳" | "年缴" => return Some(PaymentMethod::Annual),
            _ => {}
        }
        match s.trim().to_uppercase().as_str() {
            "MONTHLY" => Some(PaymentMethod::Monthly),
            "SEMI_ANNUAL" => Some(PaymentMethod::SemiAnnual),
            "ANNUAL" => Some(PaymentMethod::Annual),
            _ => None,
        }
    }
}
