//! Display formatting for deposit/rent amounts given in units of 10,000 won (만원).

/// `"25,000"` -> `"2억5000"`, `"30000"` -> `"3억"`, `"800"` -> `"800"`.
///
/// Values already containing `억` and non-numeric text pass through unchanged.
pub fn format_money(raw: &str) -> String {
    if raw.is_empty() {
        return "0".to_string();
    }
    if raw.contains('억') {
        return raw.to_string();
    }
    let amount = match raw.trim().replace(',', "").parse::<i64>() {
        Ok(amount) => amount,
        Err(_) => return raw.to_string(),
    };
    if amount < 10_000 {
        return amount.to_string();
    }
    let (eok, man) = (amount / 10_000, amount % 10_000);
    if man == 0 {
        format!("{}억", eok)
    } else {
        format!("{}억{}", eok, man)
    }
}
