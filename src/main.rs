fn main() -> anyhow::Result<()> {
    dataset_curator::run()
}
