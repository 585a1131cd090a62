// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod common;
pub mod error;
pub mod label_selector;
pub mod pod;
pub mod prelude;
pub mod service;
