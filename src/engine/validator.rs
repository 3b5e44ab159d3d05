// ==========================================
// 特殊定尺钢筋采购优化系统 - 目录与约束校验器
// ==========================================
// 职责: 全局策略范围 + 厂商最小起订的前置校验
// 输入: 不可变 Policy + 目录行 (纯函数, 无副作用)
// 输出: Ok / 带显式原因的拒绝
// 红线: 校验先于优化器执行; 用户手工提案长度时再次执行
// ==========================================

use crate::domain::catalog::{Catalog, Policy, StockLength};
use crate::domain::types::Diameter;
use crate::engine::error::{EngineError, EngineResult};
use tracing::debug;

// ==========================================
// CatalogValidator - 目录与约束校验器
// ==========================================
pub struct CatalogValidator;

impl CatalogValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验单条目录行的长度合法性 (策略范围 + 粒度)
    ///
    /// # 参数
    /// - policy: 全局长度策略 (只读快照)
    /// - row: 候选目录行
    pub fn validate_length(&self, policy: &Policy, row: &StockLength) -> EngineResult<()> {
        if !row.is_granular() {
            return Err(EngineError::InvalidGranularity {
                length_mm: row.length_mm,
            });
        }

        if !policy.contains(row.length_mm) {
            return Err(EngineError::OutOfPolicyRange {
                length_mm: row.length_mm,
                min_mm: policy.min_usable_length_mm,
                max_mm: policy.max_usable_length_mm,
            });
        }

        Ok(())
    }

    /// 校验目录行对给定需求吨位是否可达最小起订
    ///
    /// 说明: 即使把该直径的全部需求都分配给该行, 仍不足最小起订时,
    /// 该行在本次优化中不可能出现在任何可行方案里, 前置剔除。
    pub fn validate_for_demand(
        &self,
        policy: &Policy,
        row: &StockLength,
        demand_tonnage: f64,
    ) -> EngineResult<()> {
        self.validate_length(policy, row)?;

        if demand_tonnage < row.min_order_tonnage {
            return Err(EngineError::BelowManufacturerMinTonnageForLength {
                manufacturer_id: row.manufacturer_id.clone(),
                length_mm: row.length_mm,
                min_order_tonnage: row.min_order_tonnage,
                demand_tonnage,
            });
        }

        Ok(())
    }

    /// 过滤出某直径的全部合格目录行 (优化器候选集)
    ///
    /// # 返回
    /// (合格行, 拒绝原因列表) - 拒绝行带显式原因, 供审计展示
    pub fn validated_rows<'a>(
        &self,
        policy: &Policy,
        catalog: &'a Catalog,
        diameter: Diameter,
        demand_tonnage: f64,
    ) -> (Vec<&'a StockLength>, Vec<EngineError>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for row in catalog.rows_for(diameter) {
            match self.validate_for_demand(policy, row, demand_tonnage) {
                Ok(()) => accepted.push(row),
                Err(e) => {
                    debug!(
                        diameter = %diameter,
                        manufacturer = %row.manufacturer_id,
                        length_mm = row.length_mm,
                        reason = %e,
                        "目录行被剔除"
                    );
                    rejected.push(e);
                }
            }
        }

        (accepted, rejected)
    }
}

impl Default for CatalogValidator {
    fn default() -> Self {
        Self::new()
    }
}
