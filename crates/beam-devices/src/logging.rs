//! 日志初始化
//!
//! 安装 `tracing` 的 fmt 订阅器，并把 `log` crate 的记录转发到 `tracing`。
//! 过滤规则优先读取 `RUST_LOG`，未设置时使用调用方给出的默认规则。

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// 初始化全局日志
///
/// 返回 `false` 表示全局订阅器已经存在（例如重复调用），此时不做任何修改。
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // log 记录可能已被其他 logger 接管，忽略即可
    let _ = tracing_log::LogTracer::init();
    true
}
