fn main() {
    if let Err(e) = gwlauncher_lib::run() {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
