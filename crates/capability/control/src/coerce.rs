//! 控制器变量值的宽松转换。
//!
//! 控制器返回的都是文本，同一个量在不同固件上可能是 `"1"`、`"ON"`、`"21,5"` 或 `"21.5 °C"`。

/// 布尔转换：能解析为数值时大于 0 为真；否则匹配
/// `1/on/true/running/active/enabled`（不区分大小写）。空串为假。
pub fn to_bool(raw: &str) -> bool {
    let text = raw.trim();
    if text.is_empty() {
        return false;
    }
    if let Ok(number) = text.parse::<f64>() {
        if !number.is_nan() {
            return number > 0.0;
        }
    }
    matches!(
        text.to_ascii_lowercase().as_str(),
        "1" | "on" | "true" | "running" | "active" | "enabled"
    )
}

/// 数值转换：第一个逗号视为小数点，取第一个形如 `-?\d+(\.\d+)?` 的片段。
pub fn to_num(raw: &str) -> Option<f64> {
    let text = raw.replacen(',', ".", 1);
    let bytes = text.as_bytes();
    let first_digit = bytes.iter().position(u8::is_ascii_digit)?;
    let start = if first_digit > 0 && bytes[first_digit - 1] == b'-' {
        first_digit - 1
    } else {
        first_digit
    };

    let mut end = first_digit;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    text[start..end].parse().ok()
}

/// 保留一位小数。
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 限制在 `[min, max]`；NaN 取 `min`。
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_coercion() {
        assert!(to_bool("1"));
        assert!(to_bool("2.5"));
        assert!(to_bool("Running"));
        assert!(to_bool(" ON "));
        assert!(!to_bool("0"));
        assert!(!to_bool("-1"));
        assert!(!to_bool(""));
        assert!(!to_bool("off"));
        assert!(!to_bool("nan"));
    }

    #[test]
    fn num_coercion() {
        assert_eq!(to_num("21,5"), Some(21.5));
        assert_eq!(to_num("21.5 °C"), Some(21.5));
        assert_eq!(to_num("temp=-3.25"), Some(-3.25));
        assert_eq!(to_num("12."), Some(12.0));
        assert_eq!(to_num("1,2,3"), Some(1.2));
        assert_eq!(to_num("n/a"), None);
        assert_eq!(to_num(""), None);
    }

    #[test]
    fn rounding_and_clamp() {
        assert_eq!(round1(22.46), 22.5);
        assert_eq!(round1(21.0), 21.0);
        assert_eq!(clamp(75.0, 0.0, 50.0), 50.0);
        assert_eq!(clamp(-5.0, 0.0, 50.0), 0.0);
        assert_eq!(clamp(f64::NAN, 0.0, 50.0), 0.0);
    }
}
