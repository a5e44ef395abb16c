fn main() {
    if let Err(err) = llm_playground::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
