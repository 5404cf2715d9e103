fn main() {
    if let Err(err) = datainsight_lib::run() {
        eprintln!("datainsight: {}", err);
        std::process::exit(1);
    }
}
