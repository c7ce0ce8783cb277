use laplace_sdc::{ObfuscatorConfig, RandomSource};
use tracing_subscriber::EnvFilter;

fn main() -> laplace_sdc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let obfuscator = ObfuscatorConfig::default()
        .with_random_source(RandomSource::from_seed_bytes(&[0xDE, 0xAD, 0xBE, 0xEF]))
        .with_rounding_step(5)
        .build()?;

    for stratum in 1..=3 {
        let answer = obfuscator.privatize_in_bin(1_234, 1.0, 0.5, stratum)?;
        println!("stratum {stratum}: {answer}");
    }

    let repeated = obfuscator.privatize_in_bin(1_234, 1.0, 0.5, 1)?;
    println!("stratum 1 again: {repeated}");
    println!("cached entries: {}", obfuscator.cached_entries()?);

    obfuscator.clear_cache()?;
    let fresh = obfuscator.privatize_in_bin(1_234, 1.0, 0.5, 1)?;
    println!("stratum 1 after clearing: {fresh}");
    Ok(())
}
