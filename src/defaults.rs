use chrono::NaiveTime;

pub const DEFAULT_LEAD_TIME_HOURS: i64 = 2;

pub fn default_business_open() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static default business open")
}

pub fn default_business_close() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).expect("valid static default business close")
}
