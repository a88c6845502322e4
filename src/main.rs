#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod app_core;
#[cfg(target_arch = "wasm32")]
mod file_io;
#[cfg(target_arch = "wasm32")]
mod yew_app;

#[cfg(target_arch = "wasm32")]
fn main() {
    gloo::console::log!("hexflower start");
    yew_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("hexflower runs in the browser (build for wasm32 with trunk); use hexflower-cli for board files");
}
