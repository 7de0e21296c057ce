fn main() -> anyhow::Result<()> {
    perfpair::run()
}
