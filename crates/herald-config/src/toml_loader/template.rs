//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Herald Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[connection]
url = "ws://localhost:8080/ws"
# connect_timeout_ms = 15000     # 1000-60000
# settle_ms = 150                # 50-5000, wait for registration ack
# heartbeat_interval_ms = 4000   # 1000-60000, both directions
# missed_heartbeats = 3          # 1-10
# reconnect_delay_ms = 5000      # 100-300000, fixed delay
# max_reconnect_attempts = 0     # 0 = retry forever

[presence]
# client_id = "visitor-ab12cd"   # generated per run when unset
location = "public"
# event_topics = ["topic-backups", "topic-notifications"]

[notifications]
# sound_asset = "sounds/notification.mp3"
# vibration_pattern_ms = [200, 100, 200]
# feedback_timeout_ms = 2000     # 100-10000
# default_target_url = "/admin"
# display_capacity = 16          # 1-100
# display_ttl_secs = 10          # 1-3600

[notifications.tone]
# frequency_hz = 880.0           # 20.0-20000.0
# duration_ms = 300              # 20-2000
# gain = 0.3                     # 0.0-1.0
# sample_rate = 44100            # 8000-192000

[logging]
# level = "info"                 # trace | debug | info | warn | error
"##
    .to_string()
}
