// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod cluster_accessor;
pub mod controller_runtime;
pub mod health;
