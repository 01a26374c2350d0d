//! INDI Protocol Property Implementation
//!
//! This module provides the canonical enum value types shared across the wire
//! message structs (`message/`), the property store (`store/`), and the
//! public client API. Properties represent device characteristics and
//! controls, with different kinds (Number, Text, Switch, Light), states
//! (Idle, Ok, Busy, Alert), and permissions (ro, wo, rw).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Property permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyPerm {
    /// Read-only property
    Ro,
    /// Write-only property
    Wo,
    /// Read-write property
    Rw,
}

impl FromStr for PropertyPerm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ro" => Ok(PropertyPerm::Ro),
            "wo" => Ok(PropertyPerm::Wo),
            "rw" => Ok(PropertyPerm::Rw),
            _ => Err(Error::UnknownEnumValue("PropertyPerm".to_string(), s.to_string())),
        }
    }
}

impl fmt::Display for PropertyPerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPerm::Ro => write!(f, "ro"),
            PropertyPerm::Wo => write!(f, "wo"),
            PropertyPerm::Rw => write!(f, "rw"),
        }
    }
}

/// Property state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PropertyState {
    /// Property is idle
    Idle,
    /// Property is in its nominal state
    Ok,
    /// Property is being updated
    Busy,
    /// Property has an error
    Alert,
}

impl FromStr for PropertyState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Idle" => Ok(PropertyState::Idle),
            "Ok" => Ok(PropertyState::Ok),
            "Busy" => Ok(PropertyState::Busy),
            "Alert" => Ok(PropertyState::Alert),
            _ => Err(Error::UnknownEnumValue("PropertyState".to_string(), s.to_string())),
        }
    }
}

impl fmt::Display for PropertyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyState::Idle => write!(f, "Idle"),
            PropertyState::Ok => write!(f, "Ok"),
            PropertyState::Busy => write!(f, "Busy"),
            PropertyState::Alert => write!(f, "Alert"),
        }
    }
}

/// Switch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SwitchState {
    /// Switch is on
    On,
    /// Switch is off
    Off,
}

impl FromStr for SwitchState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "On" => Ok(SwitchState::On),
            "Off" => Ok(SwitchState::Off),
            _ => Err(Error::UnknownEnumValue("SwitchState".to_string(), s.to_string())),
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::On => write!(f, "On"),
            SwitchState::Off => write!(f, "Off"),
        }
    }
}

/// Switch rule, governing how many elements of a switch vector may be On at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SwitchRule {
    /// Exactly one switch must be On
    OneOfMany,
    /// At most one switch may be On, all may be Off
    AtMostOne,
    /// Any number of switches may be On
    AnyOfMany,
}

impl FromStr for SwitchRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OneOfMany" => Ok(SwitchRule::OneOfMany),
            "AtMostOne" => Ok(SwitchRule::AtMostOne),
            "AnyOfMany" => Ok(SwitchRule::AnyOfMany),
            _ => Err(Error::UnknownEnumValue("SwitchRule".to_string(), s.to_string())),
        }
    }
}

impl fmt::Display for SwitchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchRule::OneOfMany => write!(f, "OneOfMany"),
            SwitchRule::AtMostOne => write!(f, "AtMostOne"),
            SwitchRule::AnyOfMany => write!(f, "AnyOfMany"),
        }
    }
}

/// Discriminant for the kind of a property vector, independent of any
/// particular wire struct. Used by the store and the parser to dispatch
/// without re-deriving the kind from the def/set struct's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Number vector
    Number,
    /// Text vector
    Text,
    /// Switch vector
    Switch,
    /// Light vector (read-only, server-reported status)
    Light,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Number => write!(f, "number"),
            PropertyKind::Text => write!(f, "text"),
            PropertyKind::Switch => write!(f, "switch"),
            PropertyKind::Light => write!(f, "light"),
        }
    }
}
