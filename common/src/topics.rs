pub const TOPIC_LIGHTS_SET: &str = "lights/barn/set";
