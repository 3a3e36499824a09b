//! Interactive console prompt for a single request.

use pricepipe_core::{Period, PriceRequest, Ticker};
use std::io::{self, BufRead, Write};

/// Read one line, trimmed. `None` on end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask for a ticker until it validates.
pub fn prompt_ticker<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<Option<Ticker>> {
    loop {
        write!(out, "\nEnter the stock ticker symbol (e.g., AAPL, GOOGL, TSLA): ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match Ticker::parse(&line) {
            Ok(ticker) => return Ok(Some(ticker)),
            Err(e) => writeln!(out, "Please enter a valid ticker symbol: {e}")?,
        }
    }
}

/// Ask for a period until it validates. Blank input takes `default`.
pub fn prompt_period<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    default: Period,
) -> io::Result<Option<Period>> {
    writeln!(out, "\nValid periods: {}", Period::valid_tokens())?;
    loop {
        write!(out, "Enter the period (default is '{default}'): ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(Some(default));
        }
        match Period::parse(&line) {
            Ok(period) => return Ok(Some(period)),
            Err(_) => writeln!(
                out,
                "Invalid period. Please choose from: {}",
                Period::valid_tokens()
            )?,
        }
    }
}

/// Full prompt: banner, ticker, period. `None` if input ended first.
pub fn prompt_request<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    default_period: Period,
) -> io::Result<Option<PriceRequest>> {
    writeln!(out, "=== Stock Data Pipeline ===")?;
    writeln!(out, "Welcome! Let's get some stock data.")?;

    let Some(ticker) = prompt_ticker(input, out)? else {
        return Ok(None);
    };
    let Some(period) = prompt_period(input, out, default_period)? else {
        return Ok(None);
    };
    Ok(Some(PriceRequest::new(ticker, period)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str) -> (Option<PriceRequest>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let request = prompt_request(&mut input, &mut out, Period::OneYear).unwrap();
        (request, String::from_utf8(out).unwrap())
    }

    #[test]
    fn accepts_ticker_and_period() {
        let (request, out) = run("msft\n5y\n");
        let request = request.unwrap();
        assert_eq!(request.ticker.as_str(), "MSFT");
        assert_eq!(request.period, Period::FiveYears);
        assert!(out.contains("=== Stock Data Pipeline ==="));
        assert!(out.contains("Valid periods: 1d, 5d, 1mo"));
    }

    #[test]
    fn blank_period_uses_default() {
        let (request, _) = run("AAPL\n\n");
        assert_eq!(request.unwrap().period, Period::OneYear);
    }

    #[test]
    fn reprompts_until_ticker_valid() {
        let (request, out) = run("\na\n^GSPC\nspy\n1mo\n");
        assert_eq!(request.unwrap().ticker.as_str(), "SPY");
        assert_eq!(out.matches("Please enter a valid ticker symbol").count(), 3);
    }

    #[test]
    fn reprompts_until_period_valid() {
        let (request, out) = run("AAPL\n3y\nYTD\n");
        assert_eq!(request.unwrap().period, Period::YearToDate);
        assert_eq!(out.matches("Invalid period").count(), 1);
    }

    #[test]
    fn end_of_input_aborts() {
        assert!(run("").0.is_none());
        assert!(run("AAPL\n").0.is_none());
        assert!(run("a\n").0.is_none());
    }
}
