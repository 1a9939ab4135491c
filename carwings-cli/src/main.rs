fn main() {
    if let Err(err) = carwings::app::run() {
        eprintln!("carwings failed: {err}");
        std::process::exit(1);
    }
}
