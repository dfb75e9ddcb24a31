//! # BMS Storage 模块
//!
//! 机组清单、定时任务、开关机日志与用户的存储抽象层。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：每类资源一个异步 Trait
//! 2. **数据模型层** (`models.rs`)：记录与输入结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **数据集** (`dataset.rs`)：两种后端共用的纯内存操作
//! 5. **实现层**：
//!    - `in_memory`：`RwLock` 保护的数据集（测试与演示）
//!    - `json_file`：单个 JSON 文件，临时文件 + rename 原子替换（默认后端）
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use bms_storage::{JsonFileStore, PowerLogPolicy, TimerStore};
//!
//! let store = JsonFileStore::open("data/db.json", PowerLogPolicy::default()).await?;
//! let timer = store.find_active_timer("10.0.0.5").await?;
//! ```
//!
//! ## 设计约束
//!
//! - Handler 层不直接读写数据文件，统一通过 storage 层
//! - 定时任务与机组只做软删除
//! - 开关机日志最新在前，追加时执行保留期与条数上限

pub mod dataset;
pub mod error;
pub mod in_memory;
pub mod json_file;
pub mod models;
pub mod traits;

pub use dataset::Dataset;
pub use error::*;
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use models::*;
pub use traits::*;
