use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Public PageSpeed Insights v5 endpoint
pub const PSI_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

const DEFAULT_PORT: u16 = 2112;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

pub fn get_default_addr() -> IpAddr {
    DEFAULT_ADDR
}

/// Minutes of the hour at which a sweep runs when none are configured
pub const DEFAULT_MINUTES: &str = "0,30";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub fn get_default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// Delay between two targets of the same sweep
pub const SWEEP_PACING: Duration = Duration::from_secs(2);

/// How often the scheduler compares the wall clock against the trigger minutes
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);
