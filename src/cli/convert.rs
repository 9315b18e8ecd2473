use anyhow::{Context, Result};
use std::io::Write;
use std::num::ParseFloatError;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::{CallContext, ExchangeError, ExchangeRequest, Exchanger};

/// Budget for the single outbound lookup, on top of any caller deadline.
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("usage: fxcli <amount> <from> <to>")]
    Usage,
    #[error("error parsing amount: {0}")]
    Parse(#[from] ParseFloatError),
    #[error("amount must be a finite number: {0}")]
    NonFinite(f64),
    #[error("amount cannot be negative or zero: {0:.2}")]
    NonPositive(f64),
}

/// Validates and normalizes the positional arguments into a request.
pub fn parse_request(args: &[String]) -> Result<ExchangeRequest, CommandError> {
    let [amount, from, to] = args else {
        return Err(CommandError::Usage);
    };

    let amount: f64 = amount.parse()?;
    if !amount.is_finite() {
        return Err(CommandError::NonFinite(amount));
    }
    if amount <= 0.0 {
        return Err(CommandError::NonPositive(amount));
    }

    Ok(ExchangeRequest {
        amount,
        from: from.to_uppercase(),
        to: to.to_uppercase(),
    })
}

/// Runs one conversion: validate, announce, look up under a bounded
/// deadline, then report.
///
/// Cancellation and deadline errors are returned as-is so the caller can
/// downcast them to [`crate::core::Interrupted`]; every other lookup
/// failure is wrapped with context.
pub async fn execute<W: Write>(
    ctx: &CallContext,
    args: &[String],
    exchanger: &dyn Exchanger,
    out: &mut W,
) -> Result<()> {
    let request = parse_request(args)?;
    debug!(?request, "Parsed exchange request");

    writeln!(out, "Exchange {} {} to {}", request.amount, request.from, request.to)
        .context("Failed to write output")?;

    let call_ctx = ctx.with_timeout(EXCHANGE_TIMEOUT);
    let res = match exchanger.exchange(&call_ctx, &request).await {
        Ok(res) => res,
        Err(ExchangeError::Interrupted(interrupted)) => return Err(interrupted.into()),
        Err(e) => return Err(anyhow::Error::new(e).context("cannot get exchange rate")),
    };

    writeln!(out, "You received {} {}", res, request.to).context("Failed to write output")?;
    Ok(())
}
