use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref USER_MENTION: Regex = Regex::new(r"^<@!?(\d+)>$").unwrap();
    pub static ref CHANNEL_MENTION: Regex = Regex::new(r"^<#(\d+)>$").unwrap();
    pub static ref ROLE_MENTION: Regex = Regex::new(r"^<@&(\d+)>$").unwrap();
    pub static ref SNOWFLAKE: Regex = Regex::new(r"^\d{15,20}$").unwrap();
    pub static ref LOCALE_KEY: Regex = Regex::new(r"\{\{(%?)([A-Za-z0-9_.\-]+)\}\}").unwrap();
    pub static ref LOCALE_PARAM: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}
