use {
    alloy::primitives::{
        U256,
        utils::{ParseUnits, format_units, parse_units},
    },
    anyhow::{Context, Result, bail},
};

/// Scales a human readable token amount (e.g. `"1.5"`) into the token's
/// smallest unit.
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<U256> {
    match parse_units(amount.trim(), decimals)
        .with_context(|| format!("invalid token amount {amount:?}"))?
    {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => bail!("token amount {amount:?} is negative"),
    }
}

/// Renders an amount in the token's smallest unit with two decimal places,
/// rounding down.
pub fn format_token_amount(amount: U256, decimals: u8) -> Result<String> {
    let formatted = format_units(amount, decimals)
        .with_context(|| format!("cannot format amount with {decimals} decimals"))?;
    Ok(match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction: String = fraction.chars().chain("00".chars()).take(2).collect();
            format!("{whole}.{fraction}")
        }
        None => format!("{formatted}.00"),
    })
}
