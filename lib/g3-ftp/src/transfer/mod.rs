/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod line;
pub use line::FtpLineDataReceiver;
pub(crate) use line::FtpLineDataTransfer;

mod stream;
pub use stream::FtpTransferStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FtpTransferType {
    Ascii,
    Image,
}
