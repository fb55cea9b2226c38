use std::process::ExitCode;
use std::sync::Arc;

use devserve::config::Config;
use devserve::error::ServerError;
use devserve::logger;
use devserve::server::{start_signal_handler, Server, SignalHandler};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ServerError> {
    let cfg = Config::load()?;
    logger::init(&cfg).map_err(ServerError::Logger)?;

    // 创建 Tokio 运行时，根据 workers 配置设置线程数
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    let server = Server::bind(cfg)?;
    let addr = server.local_addr().map_err(ServerError::Runtime)?;

    let signals = SignalHandler::new();
    start_signal_handler(&signals).map_err(ServerError::Signal)?;

    logger::log_server_start(&addr, server.state());

    server.run(Arc::clone(&signals.shutdown)).await;
    Ok(())
}
