// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub use crate::kubernetes_api_objects::common::*;
pub use crate::kubernetes_api_objects::error::*;
pub use crate::kubernetes_api_objects::label_selector::*;
pub use crate::kubernetes_api_objects::pod::*;
pub use crate::kubernetes_api_objects::service::*;
