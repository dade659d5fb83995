use anyhow::{Context, Result, bail};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse tier sizes such as `1000,100,10`. Sizes must be positive and never
/// grow from one tier to the next.
pub fn parse_tiers(s: &str) -> Result<Vec<usize>> {
    let mut tiers = Vec::new();
    for token in split_csv(s) {
        let size: usize = token
            .parse()
            .with_context(|| format!("invalid tier size {token:?}"))?;
        if size == 0 {
            bail!("tier sizes must be positive");
        }
        if tiers.last().is_some_and(|prev| size > *prev) {
            bail!("tier {size} is larger than the tier before it");
        }
        tiers.push(size);
    }
    if tiers.is_empty() {
        bail!("at least one tier is required");
    }
    Ok(tiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn tiers_must_shrink() {
        assert_eq!(parse_tiers("1000, 100,10").unwrap(), vec![1000, 100, 10]);
        assert_eq!(parse_tiers("5,5").unwrap(), vec![5, 5]);
        assert!(parse_tiers("10,20").is_err());
        assert!(parse_tiers("10,0").is_err());
        assert!(parse_tiers("ten").is_err());
        assert!(parse_tiers(" , ").is_err());
    }
}
