// ==========================================
// 特殊定尺钢筋采购优化系统 - 引擎层错误类型
// ==========================================
// 红线: 错误按直径/捆包作用域隔离, 单点失败不阻断整体
// 红线: 越界长度直接拒绝, 不得静默夹取 (clamp)
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::Diameter;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 目录校验错误 =====
    #[error("长度越界: length={length_mm}mm 不在策略范围 [{min_mm}, {max_mm}] 内")]
    OutOfPolicyRange {
        length_mm: i64,
        min_mm: i64,
        max_mm: i64,
    },

    #[error("长度粒度非法: length={length_mm}mm 不满足 10mm 目录粒度")]
    InvalidGranularity { length_mm: i64 },

    #[error(
        "低于厂商该长度最小起订吨位: manufacturer={manufacturer_id}, length={length_mm}mm, \
         min_order={min_order_tonnage}t, demand={demand_tonnage}t"
    )]
    BelowManufacturerMinTonnageForLength {
        manufacturer_id: String,
        length_mm: i64,
        min_order_tonnage: f64,
        demand_tonnage: f64,
    },

    #[error("未知厂商: {manufacturer_id}")]
    UnknownManufacturer { manufacturer_id: String },

    // ===== 需求聚合错误 =====
    #[error("无配筋需求: diameter={diameter}")]
    EmptyDemand { diameter: Diameter },

    #[error("需求不一致: diameter={diameter}, 明细合计={detail_mm}mm, 聚合值={aggregate_mm}mm")]
    InconsistentDemand {
        diameter: Diameter,
        detail_mm: i64,
        aggregate_mm: i64,
    },

    // ===== 优化器错误 =====
    #[error("无可行方案: diameter={diameter}, 原因: {reason}")]
    Infeasible { diameter: Diameter, reason: String },

    #[error("候选集为空: diameter={diameter} (目录中无通过校验的定尺长度)")]
    NoCandidates { diameter: Diameter },

    // ===== 排程错误 =====
    #[error("缺少要求到货日: bar_mark={bar_mark} (进度层未提供日期)")]
    MissingRequiredDate { bar_mark: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
