// ==========================================
// 智能垃圾桶车队 - 垃圾桶 API
// ==========================================
// 职责: 垃圾桶查询、创建、稀疏更新、清空
// 校验: 所有输入在写入前完成校验，失败时无任何写入
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::bin::{Bin, BinFilter, BinPatch, NewBin, DEFAULT_CAPACITY_LITERS};
use crate::engine::bin_state;
use crate::perf::PerfGuard;
use crate::repository::bin_repo::BinRepository;

// ==========================================
// 请求类型
// ==========================================

/// 列表查询参数（原始字符串，由 API 层解析）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBinsQuery {
    pub district: Option<String>,
    pub bin_type: Option<String>,
    pub status: Option<String>,
    pub min_fill: Option<i32>,
}

/// 创建垃圾桶请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBinRequest {
    pub location: String,
    pub district: String,
    /// 缺省为 general
    #[serde(default)]
    pub bin_type: Option<String>,
    /// 缺省为 120 升
    #[serde(default)]
    pub capacity_liters: Option<i32>,
}

/// 稀疏更新请求：只更新提供了值的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinUpdateRequest {
    #[serde(default)]
    pub current_fill_percentage: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub maintenance_required: Option<bool>,
}

// ==========================================
// BinApi - 垃圾桶 API
// ==========================================
pub struct BinApi {
    bin_repo: Arc<BinRepository>,
}

impl BinApi {
    pub fn new(bin_repo: Arc<BinRepository>) -> Self {
        Self { bin_repo }
    }

    /// 查询垃圾桶列表（条件 AND 组合），按填充率降序
    pub fn list_bins(&self, query: &ListBinsQuery) -> ApiResult<Vec<Bin>> {
        let _perf = PerfGuard::new("list_bins");

        let filter = BinFilter {
            district: validator::optional_text(query.district.as_deref()),
            bin_type: query
                .bin_type
                .as_deref()
                .map(validator::parse_bin_type)
                .transpose()?,
            status: query
                .status
                .as_deref()
                .map(validator::parse_bin_status)
                .transpose()?,
            min_fill: query.min_fill,
        };

        Ok(self.bin_repo.list(&filter)?)
    }

    /// 查询单个垃圾桶
    pub fn get_bin(&self, id: i64) -> ApiResult<Bin> {
        let _perf = PerfGuard::new("get_bin");

        self.bin_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Bin(id={})不存在", id)))
    }

    /// 创建垃圾桶
    ///
    /// # 返回
    /// - Ok(Bin): 新建垃圾桶 (fill=0, status=empty, maintenance=false)
    /// - Err(ValidationError / InvalidInput): 参数非法，未写入
    pub fn create_bin(&self, request: CreateBinRequest) -> ApiResult<Bin> {
        let _perf = PerfGuard::new("create_bin");

        let location = validator::require_text("location", &request.location)?;
        let district = validator::require_text("district", &request.district)?;
        let bin_type = match request.bin_type.as_deref() {
            Some(raw) => validator::parse_bin_type(raw)?,
            None => Default::default(),
        };
        let capacity = validator::validate_capacity(
            request.capacity_liters.unwrap_or(DEFAULT_CAPACITY_LITERS),
        )?;

        let new_bin = NewBin::new(location, district, bin_type).with_capacity(capacity);
        let bin = self.bin_repo.create(&new_bin)?;

        info!(bin_id = bin.id, district = %bin.district, bin_type = %bin.bin_type, "垃圾桶已创建");
        Ok(bin)
    }

    /// 稀疏更新
    ///
    /// 修改填充率/维护标志时同一事务内重新分类状态；
    /// 显式给出的 status 覆写分类结果（见 `BinPatch`）。
    pub fn update_bin(&self, id: i64, request: BinUpdateRequest) -> ApiResult<Bin> {
        let _perf = PerfGuard::new("update_bin");

        let patch = BinPatch {
            current_fill_percentage: request
                .current_fill_percentage
                .map(validator::validate_fill_percentage)
                .transpose()?,
            status: request
                .status
                .as_deref()
                .map(validator::parse_bin_status)
                .transpose()?,
            maintenance_required: request.maintenance_required,
        };

        let now = Utc::now();
        let bin = self
            .bin_repo
            .update_with(id, |bin| bin_state::apply_patch(bin, &patch, now))?;

        debug!(
            bin_id = id,
            fill = bin.current_fill_percentage,
            status = %bin.status,
            "垃圾桶已更新"
        );
        Ok(bin)
    }

    /// 清空垃圾桶（fill=0, status=empty, last_emptied=now；维护标志不变）
    pub fn empty_bin(&self, id: i64) -> ApiResult<Bin> {
        let _perf = PerfGuard::new("empty_bin");

        let now = Utc::now();
        let bin = self
            .bin_repo
            .update_with(id, |bin| bin_state::reset(bin, now))?;

        info!(bin_id = id, "垃圾桶已清空");
        Ok(bin)
    }
}
