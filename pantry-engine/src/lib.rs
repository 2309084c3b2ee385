//! Pantry Engine - 订餐与公告投票核心引擎
//!
//! # 架构概述
//!
//! 办公室茶水间服务的核心库：固定时段饮品订单、公告板投票、管理端统计。
//! 所有共享状态 (每日聚合、公告) 只通过存储层的乐观事务修改，
//! 进程内不持有任何跨事务的锁，多实例并发部署下依然正确。
//!
//! # 模块结构
//!
//! ```text
//! pantry-engine/src/
//! ├── config/        # 配置 (时区、数据目录、重试预算)
//! ├── engine/        # 组装入口
//! ├── slots/         # 订餐时段计算 (纯函数)
//! ├── store/         # redb 文档存储 + 乐观事务
//! ├── ledger/        # 订单账本 (每时段一单、历史、统计)
//! ├── notices/       # 公告与投票
//! ├── stats/         # 管理端按日汇总
//! └── utils/         # 日志、时间工具
//! ```

pub mod config;
pub mod engine;
pub mod ledger;
pub mod notices;
pub mod slots;
pub mod stats;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use config::Config;
pub use engine::Engine;
pub use ledger::{
    Beverage, DailyCounts, LedgerError, OrderInput, OrderLedger, OrderPage, OrderPlaced,
    OrderRecord, UserStats,
};
pub use notices::{
    Author, Notice, NoticeError, NoticeInput, NoticeService, NoticeUpdate, PollOption, VoteChoice,
    VoteOutcome,
};
pub use slots::{SlotName, SlotStatus, belongs_to_slot, classify};
pub use stats::{DailyTotals, StatsService};
pub use store::{LedgerStore, StoreError};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
