use crate::models::{ApiType, AuthMethod, KeyLocation, KeyMap, Profile};
use crate::storage::ProfileStore;
use anyhow::{bail, Context, Result};

/// Redact a secret for safe display (show first 4 + last 4 chars)
pub fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Copy of `profile` with every key value redacted.
pub fn redacted(profile: &Profile) -> Profile {
    let mut profile = profile.clone();
    for value in profile.keys.values_mut() {
        *value = redact_key(value);
    }
    profile
}

/// Parse `name=value,name2=value2`. Values may contain `=`; names may not be empty.
pub fn parse_key_pairs(input: &str) -> Result<KeyMap> {
    let mut keys = KeyMap::new();
    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Invalid key pair '{}': expected name=value", pair);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid key pair '{}': key name is empty", pair);
        }
        keys.insert(name.to_string(), value.trim().to_string());
    }
    Ok(keys)
}

/// Profile fields settable from the command line.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct ProfileFields {
    /// Keys as name=value pairs, comma separated (replaces all keys)
    #[arg(short, long)]
    pub keys: Option<String>,
    /// Base URL of the API
    #[arg(short = 'u', long = "url")]
    pub base_url: Option<String>,
    /// API type (llm, rest, oauth, custom)
    #[arg(long)]
    pub api_type: Option<ApiType>,
    /// Auth method (bearer, apikey, basic, custom)
    #[arg(long)]
    pub auth_method: Option<AuthMethod>,
    /// Header carrying the key (apikey/custom)
    #[arg(long)]
    pub header_name: Option<String>,
    /// Header value template, `{key}` is replaced by the secret
    #[arg(long)]
    pub header_format: Option<String>,
    /// Query parameter carrying the key when --location query
    #[arg(long)]
    pub param_name: Option<String>,
    /// Where the key is sent (header, query)
    #[arg(long)]
    pub location: Option<KeyLocation>,
    /// Key holding the basic-auth username
    #[arg(long)]
    pub username_field: Option<String>,
    /// Key holding the basic-auth password
    #[arg(long)]
    pub password_field: Option<String>,
    /// Path probed by `akm test` for non-LLM APIs
    #[arg(long)]
    pub test_endpoint: Option<String>,
    /// HTTP method of the test request
    #[arg(long)]
    pub test_method: Option<String>,
}

impl ProfileFields {
    /// Overwrite the fields that were passed; leave the rest untouched.
    pub fn apply(self, profile: &mut Profile) -> Result<()> {
        if let Some(ref keys) = self.keys {
            profile.keys = parse_key_pairs(keys)?;
        }
        if let Some(url) = self.base_url {
            profile.base_url = Some(url);
        }
        if let Some(api_type) = self.api_type {
            profile.api_type = Some(api_type);
        }
        if let Some(auth_method) = self.auth_method {
            profile.auth_method = Some(auth_method);
        }
        if let Some(endpoint) = self.test_endpoint {
            profile.test_endpoint = Some(endpoint);
        }
        if let Some(method) = self.test_method {
            profile.test_method = Some(method);
        }

        let mut auth_config = profile.auth_config.take().unwrap_or_default();
        let fields = [
            (&mut auth_config.header_name, self.header_name),
            (&mut auth_config.header_format, self.header_format),
            (&mut auth_config.param_name, self.param_name),
            (&mut auth_config.username_field, self.username_field),
            (&mut auth_config.password_field, self.password_field),
        ];
        for (slot, value) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
        if let Some(location) = self.location {
            auth_config.location = Some(location);
        }
        profile.auth_config = (!auth_config.is_empty()).then_some(auth_config);
        Ok(())
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize profile")?;
    println!("{}", json);
    Ok(())
}

pub fn cmd_list(store: &ProfileStore, show_secrets: bool) -> Result<()> {
    let profiles = store.list()?;
    if show_secrets {
        return print_json(&profiles);
    }
    let profiles: Vec<Profile> = profiles.iter().map(redacted).collect();
    print_json(&profiles)
}

pub fn cmd_get(store: &ProfileStore, name: &str, show_secrets: bool) -> Result<()> {
    let profile = store.get(name)?;
    if show_secrets {
        print_json(&profile)
    } else {
        print_json(&redacted(&profile))
    }
}

pub fn cmd_add(store: &ProfileStore, name: &str, fields: ProfileFields) -> Result<()> {
    let mut profile = Profile::new(name);
    fields.apply(&mut profile)?;
    let key_count = profile.keys.len();
    store.add(profile)?;
    println!("✅ Profile '{}' added ({} key(s))", name, key_count);
    Ok(())
}

pub fn cmd_update(store: &ProfileStore, name: &str, fields: ProfileFields) -> Result<()> {
    let mut profile = store.get(name)?;
    fields.apply(&mut profile)?;
    store.update(name, profile)?;
    println!("✅ Profile '{}' updated", name);
    Ok(())
}

pub fn cmd_delete(store: &ProfileStore, name: &str) -> Result<()> {
    store.delete(name)?;
    println!("🗑️  Profile '{}' deleted", name);
    Ok(())
}
