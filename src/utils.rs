use indicatif::{ProgressBar, ProgressStyle};

pub fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {human_pos}/{human_len} {percent}% ({per_sec})",
        )
        .expect("hardcoded"),
    )
}

/// Whole won with thousands separators, e.g. `29,900원`.
pub fn won(amount: f64) -> String {
    let digits = (amount.abs().round() as u64).to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out.push('원');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn won_formatting() {
        assert_eq!(won(0.0), "0원");
        assert_eq!(won(900.0), "900원");
        assert_eq!(won(29900.0), "29,900원");
        assert_eq!(won(1234567.4), "1,234,567원");
        assert_eq!(won(-1000.0), "-1,000원");
    }
}
