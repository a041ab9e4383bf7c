// SPDX-License-Identifier: MIT

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Erc20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Standard vault interface: metadata accessor, read-only output
    /// estimator and the three-argument redeem.
    #[sol(rpc)]
    contract Erc4626Vault {
        function asset() external view returns (address);
        function previewRedeem(uint256 shares) external view returns (uint256 assets);
        function redeem(uint256 shares, address receiver, address owner) external returns (uint256 assets);
    }

    /// Fallback for vaults that only expose a bare single-argument redeem.
    #[sol(rpc)]
    contract BareVault {
        function redeem(uint256 shares) external;
    }
}
