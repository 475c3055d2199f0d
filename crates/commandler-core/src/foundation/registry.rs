//! The immutable controller registry.
//!
//! A [`Registry`] is assembled once through [`RegistryBuilder`] and validated
//! on [`build`](RegistryBuilder::build). Afterwards it is shared read-only by
//! every dispatcher and binder; lookups always hand out the same [`Arc`]s.

use std::collections::{HashMap, HashSet};
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::debug;

use crate::foundation::error::ConfigError;
use crate::foundation::message::MessageResolver;
use crate::foundation::metadata::{Command, Controller, ControllerBuilder, alias_eq};
use crate::framework::expression::{EventScope, check};

/// Read-only set of controllers in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    controllers: Vec<Arc<Controller>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Controllers in registration order.
    pub fn controllers(&self) -> &[Arc<Controller>] {
        &self.controllers
    }

    pub fn controller(&self, type_id: &str) -> Option<&Arc<Controller>> {
        self.controllers.iter().find(|c| c.type_id() == type_id)
    }

    /// Finds a visible controller by display name or alias, ignoring case.
    pub fn find_controller(&self, name: &str) -> Option<&Arc<Controller>> {
        self.controllers.iter().filter(|c| !c.is_hidden()).find(|c| {
            alias_eq(c.name(), name) || c.aliases().any(|a| alias_eq(a, name))
        })
    }

    /// Visible controllers grouped by their group name, in registration order.
    pub fn public_groups(&self) -> Vec<(Option<&str>, Vec<&Arc<Controller>>)> {
        let mut groups: Vec<(Option<&str>, Vec<&Arc<Controller>>)> = Vec::new();
        for controller in self.controllers.iter().filter(|c| !c.is_hidden()) {
            match groups.iter_mut().find(|(g, _)| *g == controller.group()) {
                Some((_, members)) => members.push(controller),
                None => groups.push((controller.group(), vec![controller])),
            }
        }
        groups
    }

    /// Re-checks alias uniqueness after localization.
    ///
    /// [`build`](RegistryBuilder::build) compares raw aliases; dispatchers
    /// that compare resolved aliases call this with their resolver.
    ///
    /// # Errors
    ///
    /// Fails when two aliases resolve to the same text, ignoring case.
    pub fn verify_aliases(&self, resolver: &dyn MessageResolver) -> Result<(), ConfigError> {
        validate_aliases(&self.controllers, |alias| resolver.resolve(alias))
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// Collects controllers and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    controllers: Vec<ControllerBuilder>,
}

impl RegistryBuilder {
    pub fn controller(mut self, controller: ControllerBuilder) -> Self {
        self.controllers.push(controller);
        self
    }

    pub fn add(&mut self, controller: ControllerBuilder) {
        self.controllers.push(controller);
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// Fails when two controllers share a type id, a top-level alias
    /// (controller alias or static command alias) is used twice, a controller
    /// reuses a command alias, a controller declares more than one default
    /// command, a required parameter follows an optional one, or a default
    /// expression does not parse. Alias comparisons ignore ASCII case.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let controllers: Vec<Arc<Controller>> = self
            .controllers
            .into_iter()
            .map(|b| Arc::new(b.build()))
            .collect();

        let mut type_ids = HashSet::new();

        for controller in &controllers {
            if !type_ids.insert(controller.type_id()) {
                return Err(ConfigError::DuplicateController {
                    type_id: controller.type_id().to_string(),
                });
            }

            validate_commands(controller)?;
        }
        validate_aliases(&controllers, str::to_string)?;

        debug!(controllers = controllers.len(), "Registry built");
        Ok(Registry { controllers })
    }
}

/// Checks alias uniqueness: top-level aliases (controller aliases and static
/// command aliases) across the registry, command aliases within a controller.
/// Every alias is passed through `resolve` before it is compared.
fn validate_aliases(controllers: &[Arc<Controller>], resolve: impl Fn(&str) -> String) -> Result<(), ConfigError> {
    let mut top_level: HashMap<String, String> = HashMap::new();
    for controller in controllers {
        for alias in controller.aliases() {
            claim(&mut top_level, &resolve(alias), controller.name())?;
        }
        for command in controller.static_commands() {
            let owner = format!("{}.{}", controller.name(), command.name());
            for alias in command.aliases() {
                claim(&mut top_level, &resolve(alias), &owner)?;
            }
        }

        let mut aliases = HashMap::new();
        for command in controller.commands() {
            for alias in command.aliases() {
                let alias = resolve(alias);
                claim(&mut aliases, &alias, command.name()).map_err(|_| {
                    ConfigError::DuplicateCommandAlias {
                        controller: controller.name().to_string(),
                        alias,
                    }
                })?;
            }
        }
    }
    Ok(())
}

fn claim(owners: &mut HashMap<String, String>, alias: &str, owner: &str) -> Result<(), ConfigError> {
    match owners.entry(alias.to_lowercase()) {
        Entry::Occupied(first) => Err(ConfigError::DuplicateAlias {
            alias: alias.to_string(),
            first: first.get().clone(),
            second: owner.to_string(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(owner.to_string());
            Ok(())
        }
    }
}

fn validate_commands(controller: &Controller) -> Result<(), ConfigError> {
    let defaults: Vec<&str> = controller
        .commands()
        .iter()
        .filter(|c| c.is_default())
        .map(|c| c.name())
        .collect();
    if defaults.len() > 1 {
        return Err(ConfigError::MultipleDefaults {
            controller: controller.name().to_string(),
            commands: defaults.join(", "),
        });
    }

    for command in controller.commands() {
        validate_params(controller, command)?;
    }

    Ok(())
}

/// Required parameters precede optional ones and every default parses.
fn validate_params(controller: &Controller, command: &Command) -> Result<(), ConfigError> {
    let mut optional_seen = false;
    for param in command.params() {
        match param.default_expression() {
            Some(expression) => {
                optional_seen = true;
                check(expression, EventScope::VARIABLES).map_err(|source| ConfigError::InvalidDefault {
                    controller: controller.name().to_string(),
                    command: command.name().to_string(),
                    param: param.name().to_string(),
                    source,
                })?;
            }
            None if optional_seen => {
                return Err(ConfigError::RequiredAfterOptional {
                    controller: controller.name().to_string(),
                    command: command.name().to_string(),
                    param: param.name().to_string(),
                });
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::message::{IdentityResolver, MapResolver};
    use crate::foundation::metadata::{ParamType, Parameter, TypeKey};

    fn registry() -> Registry {
        Registry::builder()
            .controller(
                Controller::builder("math")
                    .name("Math")
                    .group("Utility")
                    .alias("math")
                    .command(Command::builder("add").alias("add")),
            )
            .controller(
                Controller::builder("ping")
                    .name("Ping")
                    .group("Utility")
                    .alias("ping")
                    .command(Command::builder("pong").default_command()),
            )
            .controller(
                Controller::builder("secret")
                    .hidden()
                    .alias("secret")
                    .command(Command::builder("x").static_command().alias("x")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_returns_same_reference() {
        let registry = registry();
        let first = registry.controller("math").unwrap();
        let second = registry.find_controller("MATH").unwrap();
        assert!(Arc::ptr_eq(first, second));
    }

    #[test]
    fn test_find_controller_skips_hidden() {
        let registry = registry();
        assert!(registry.find_controller("secret").is_none());
        assert!(registry.controller("secret").is_some());
    }

    #[test]
    fn test_public_groups() {
        let registry = registry();
        let groups = registry.public_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, Some("Utility"));
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let result = Registry::builder()
            .controller(Controller::builder("a").alias("dup"))
            .controller(Controller::builder("b").alias("DUP"))
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateAlias { .. })));
    }

    #[test]
    fn test_static_alias_clashes_with_controller_alias() {
        let result = Registry::builder()
            .controller(Controller::builder("a").alias("echo"))
            .controller(
                Controller::builder("b").command(Command::builder("echo").static_command().alias("echo")),
            )
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateAlias { .. })));
    }

    #[test]
    fn test_multiple_defaults_rejected() {
        let result = Registry::builder()
            .controller(
                Controller::builder("a")
                    .command(Command::builder("one").default_command())
                    .command(Command::builder("two").default_command()),
            )
            .build();
        assert!(matches!(result, Err(ConfigError::MultipleDefaults { .. })));
    }

    #[test]
    fn test_duplicate_command_alias_rejected() {
        let result = Registry::builder()
            .controller(
                Controller::builder("a")
                    .command(Command::builder("one").alias("x"))
                    .command(Command::builder("two").alias("x")),
            )
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateCommandAlias { .. })));
    }

    #[test]
    fn test_duplicate_type_id_rejected() {
        let result = Registry::builder()
            .controller(Controller::builder("a"))
            .controller(Controller::builder("a"))
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateController { .. })));
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let result = Registry::builder()
            .controller(
                Controller::builder("c").alias("c").command(
                    Command::builder("x")
                        .alias("x")
                        .param(Parameter::new("a", ParamType::Scalar(TypeKey::STRING)).default_value("d"))
                        .param(Parameter::new("b", ParamType::Scalar(TypeKey::STRING))),
                ),
            )
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::RequiredAfterOptional { ref param, .. }) if param == "b"
        ));
    }

    #[test]
    fn test_optional_trailing_params_accepted() {
        let result = Registry::builder()
            .controller(
                Controller::builder("c").alias("c").command(
                    Command::builder("x")
                        .alias("x")
                        .param(Parameter::new("a", ParamType::Scalar(TypeKey::STRING)))
                        .param(Parameter::new("b", ParamType::Scalar(TypeKey::STRING)).default_value("${source.author}"))
                        .param(Parameter::new("c", ParamType::Array(TypeKey::I32)).default_value("${[]}")),
                ),
            )
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_malformed_default_rejected() {
        for expression in ["${source.author", "${[1, 2}", "${nobody.name}"] {
            let result = Registry::builder()
                .controller(
                    Controller::builder("c").command(
                        Command::builder("x")
                            .param(Parameter::new("a", ParamType::Scalar(TypeKey::STRING)).default_value(expression)),
                    ),
                )
                .build();
            assert!(
                matches!(result, Err(ConfigError::InvalidDefault { ref param, .. }) if param == "a"),
                "{expression} was accepted"
            );
        }
    }

    #[test]
    fn test_localized_alias_clash_rejected() {
        let registry = Registry::builder()
            .controller(Controller::builder("a").name("A").alias("calc"))
            .controller(Controller::builder("b").name("B").alias("math"))
            .build()
            .unwrap();
        assert!(registry.verify_aliases(&IdentityResolver).is_ok());

        let resolver = MapResolver::default().with("math", "CALC");
        assert!(matches!(
            registry.verify_aliases(&resolver),
            Err(ConfigError::DuplicateAlias { ref first, ref second, .. }) if first == "A" && second == "B"
        ));
    }
}
