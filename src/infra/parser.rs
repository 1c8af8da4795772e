use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// 保存時の日付フォーマット（時刻なし）
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// 文字列を日時型に変換するヘルパー関数
///
/// `dateparser`クレートを利用して、様々な形式の日付文字列を解析し、
/// `DateTime<Utc>`型に変換する。
///
/// # サポート形式の例
/// - "2025-01-15T10:00:00Z"（ニュースAPIのpublishedAt）
/// - "2025-01-15T19:00:00+09:00"
/// - "Sun, 10 Aug 2025 12:00:00 +0000"
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    // `dateparser`はタイムゾーンを持つ`DateTime`を返すため、UTCに変換する
    match dateparser::parse(date_str) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => Err(anyhow!("不正な日付形式: {}", date_str)),
    }
}

/// 文字列を暦日（時刻なし）に変換する
///
/// "YYYY-MM-DD"はそのまま暦日として解釈する。
/// `dateparser`に渡すと現在時刻で補完されUTC変換で日付がずれる可能性があるため。
/// それ以外の形式は`parse_date`でUTCに変換してから日付部分を取り出す。
pub fn parse_calendar_date(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CALENDAR_DATE_FORMAT) {
        return Some(date);
    }
    parse_date(trimmed).ok().map(|dt| dt.date_naive())
}

/// 公開日時から保存用の暦日文字列を作る
///
/// 公開日時が無い、または解析できない場合は`today`を使う
pub fn published_date_or(published_at: Option<&str>, today: NaiveDate) -> String {
    published_at
        .and_then(parse_calendar_date)
        .unwrap_or(today)
        .format(CALENDAR_DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_common_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 8, 10, 12, 30, 0).unwrap();
        assert_eq!(parse_date("2025-08-10T12:30:00Z").unwrap(), expected);
        assert_eq!(parse_date("Sun, 10 Aug 2025 12:30:00 +0000").unwrap(), expected);
        // JST (+09:00)
        assert_eq!(parse_date("2025-08-10T21:30:00+09:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid_formats() {
        assert!(parse_date("invalid-date").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_calendar_date() {
        let aug10 = NaiveDate::from_ymd_opt(2025, 8, 10).unwrap();
        assert_eq!(parse_calendar_date("2025-08-10"), Some(aug10));
        assert_eq!(parse_calendar_date(" 2025-08-10 "), Some(aug10));
        assert_eq!(parse_calendar_date("2025-08-10T23:59:00Z"), Some(aug10));
        // UTCに変換してから日付を取る
        assert_eq!(
            parse_calendar_date("2025-08-11T01:00:00+09:00"),
            Some(aug10)
        );
        assert_eq!(parse_calendar_date("2025-13-40"), None);
        assert_eq!(parse_calendar_date("not a date"), None);
        assert_eq!(parse_calendar_date(""), None);
    }

    #[test]
    fn test_published_date_or_today() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            published_date_or(Some("2024-12-24T08:00:00Z"), today),
            "2024-12-24"
        );
        assert_eq!(published_date_or(None, today), "2025-01-01");
        assert_eq!(published_date_or(Some("garbage"), today), "2025-01-01");
    }
}
