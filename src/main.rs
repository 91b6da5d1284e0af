mod api;
mod app;
mod assistant;
mod cart;
mod catalog;
mod error;
mod storage;
mod ui;
mod utils;
mod validation;

use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    if let Err(e) = crate::utils::RUNTIME.block_on(crate::app::run()) {
        log::error!("{e}");
        eprintln!("diyshop: {e}");
        std::process::exit(1);
    }
}
