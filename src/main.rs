fn main() -> anyhow::Result<()> {
    todompa::cli::run()
}
