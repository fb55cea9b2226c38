// 服务器模块：监听套接字、accept 循环、连接服务与信号处理
// bind 失败即启动失败，由 main 报告后退出

pub mod connection;
pub mod head;
pub mod listener;
pub mod signal;

// Rust 不允许 loop 作为模块名（关键字），改用 server_loop
#[path = "loop.rs"]
pub mod server_loop;

// 重新导出常用类型
pub use listener::create_listener;
pub use server_loop::Server;
pub use signal::{start_signal_handler, SignalHandler};
