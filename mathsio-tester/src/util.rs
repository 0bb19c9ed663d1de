use anyhow::{Context, Result, bail};
use mathsio_game::GameModeId;

pub const DEFAULT_SEED: u64 = 1337;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve seed tokens into distinct numeric seeds, keeping first-seen order.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. An empty list falls back to [`DEFAULT_SEED`].
pub fn resolve_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let seed = parse_seed(token)?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex seed: {token}"));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    bail!("Unrecognized seed token: {token}");
}

/// Expand `all` and mode keys into the modes to simulate, without duplicates.
pub fn resolve_modes(tokens: &[String]) -> Result<Vec<GameModeId>> {
    let mut modes: Vec<GameModeId> = Vec::new();
    for token in tokens {
        let expanded: Vec<GameModeId> = if token.eq_ignore_ascii_case("all") {
            GameModeId::ALL.to_vec()
        } else {
            let Some(mode) = GameModeId::from_key(token) else {
                bail!("Unknown game mode: {token}");
            };
            vec![mode]
        };
        for mode in expanded {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
    }
    if modes.is_empty() {
        bail!("no game modes selected");
    }
    Ok(modes)
}
