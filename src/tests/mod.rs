// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod for_each;
